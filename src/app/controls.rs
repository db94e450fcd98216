//! Overlay controls drawn on top of the canvas: the caption of the card in
//! front and previous/next buttons.
//!
//! This module is self-contained: it injects its own CSS when first used.

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;

use crate::app::carousel::item::RingItem;

static CONTROL_STYLES_INJECTED: AtomicBool = AtomicBool::new(false);

const CONTROL_CSS: &str = r#"
.carousel-caption {
  position: absolute;
  bottom: 5em;
  left: 50%;
  transform: translateX(-50%);
  text-align: center;
  pointer-events: none;
}
.carousel-caption a {
  pointer-events: auto;
  color: inherit;
  text-decoration: none;
}
.carousel-caption-title {
  font-size: 1.25em;
  color: #f2f2f2;
  text-transform: uppercase;
}
.carousel-caption-year {
  margin-top: 0.25em;
  font-size: 0.8em;
  color: #777;
}
.carousel-nav {
  position: absolute;
  bottom: 1em;
  left: 50%;
  transform: translateX(-50%);
  display: flex;
  gap: 1em;
}
.carousel-nav button {
  width: 3em;
  height: 3em;
  border-radius: 50%;
  border: 1px solid rgba(255, 255, 255, 0.2);
  background: transparent;
  color: #aaa;
  cursor: pointer;
}
.carousel-nav button:hover {
  border-color: rgba(255, 255, 255, 0.5);
  color: #fff;
}
"#;

/// What the caption shows for the card in front.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveCard {
    pub title: String,
    pub year: Option<String>,
    pub href: Option<String>,
}

impl From<&RingItem> for ActiveCard {
    fn from(ring_item: &RingItem) -> Self {
        Self {
            title: ring_item.item.title.clone(),
            year: ring_item.item.year.clone(),
            href: ring_item.item.href.clone(),
        }
    }
}

fn inject_styles() -> bool {
    !CONTROL_STYLES_INJECTED.swap(true, Ordering::SeqCst)
}

#[component]
pub fn ActiveCaption(active: RwSignal<Option<ActiveCard>>) -> impl IntoView {
    let inject = inject_styles();
    view! {
        <>
            {inject.then(|| view! { <style>{CONTROL_CSS}</style> })}
            <div class="carousel-caption">
                {move || active.get().map(|card| {
                    let title = match card.href {
                        Some(href) => view! { <a href=href>{card.title}</a> }.into_any(),
                        None => view! { <span>{card.title}</span> }.into_any(),
                    };
                    view! {
                        <p class="carousel-caption-title">{title}</p>
                        {card.year.map(|year| view! { <p class="carousel-caption-year">{year}</p> })}
                    }
                })}
            </div>
        </>
    }
}

#[component]
pub fn NavigationControls(on_prev: Rc<dyn Fn()>, on_next: Rc<dyn Fn()>) -> impl IntoView {
    let inject = inject_styles();
    view! {
        <>
            {inject.then(|| view! { <style>{CONTROL_CSS}</style> })}
            <div class="carousel-nav">
                <button aria-label="Previous slide" on:click=move |_| on_prev()>"‹"</button>
                <button aria-label="Next slide" on:click=move |_| on_next()>"›"</button>
            </div>
        </>
    }
}
