use dioxus::prelude::*;
use page_builder::properties::{Control, Field, NestedHeader, PanelSchema};
use page_builder::web;
use page_builder::ElementId;

use super::component::{report_upload_failure, ENGINE};

const UPLOAD_INPUT_ID: &str = "pb-upload-input";

#[component]
pub fn PropertiesPanel() -> Element {
    let engine = ENGINE.read();
    let Some(engine) = engine.as_ref() else {
        return rsx! {
            div { style: "color: #64748b; text-align: center; padding: 32px;", "Loading editor..." }
        };
    };

    let (Some(id), Some(PanelSchema { title, nested, fields })) =
        (engine.selected(), engine.property_panel())
    else {
        return rsx! {
            div {
                style: "color: #64748b; text-align: center; padding: 32px;",
                "Select an element to edit its properties"
            }
        };
    };

    rsx! {
        div { class: "properties-panel", style: "padding: 16px;",
            if let Some(header) = nested {
                NestedBanner { header }
            }
            h3 { style: "margin: 0 0 16px 0; font-size: 16px;", "{title} Properties" }

            for field in fields {
                FieldInput { key: "{id}-{field.property}-{field.label}", id, field }
            }

            button {
                onclick: move |_| delete_element(id),
                style: "width: 100%; margin-top: 24px; padding: 8px; cursor: pointer;
                        background: #f44336; color: white; border: none; border-radius: 4px;",
                "Delete Element"
            }
        }
    }
}

#[component]
fn NestedBanner(header: NestedHeader) -> Element {
    rsx! {
        div {
            class: "nested-element-info",
            style: "margin-bottom: 12px; padding: 8px; background: #eff6ff; border: 1px solid #bfdbfe; border-radius: 4px; font-size: 12px;",
            div { style: "font-weight: 600;", "{NestedHeader::TITLE}" }
            div { "{header.location()}" }
        }
    }
}

#[component]
fn FieldInput(id: ElementId, field: Field) -> Element {
    let property = field.property.clone();
    let caption = field.label.clone();

    let input = match field.control {
        Control::Text { placeholder } => {
            let on_blur = property.clone();
            rsx! {
                input {
                    r#type: "text",
                    value: "{field.value}",
                    placeholder,
                    style: "width: 100%; padding: 4px 6px;",
                    oninput: move |e| queue_edit(id, &property, e.value()),
                    onblur: move |_| flush_edit(id, &on_blur),
                }
            }
        }
        Control::Color => {
            let on_blur = property.clone();
            rsx! {
                input {
                    r#type: "color",
                    value: "{field.value}",
                    oninput: move |e| queue_edit(id, &property, e.value()),
                    onblur: move |_| flush_edit(id, &on_blur),
                }
            }
        }
        Control::Select { options } => rsx! {
            select {
                style: "width: 100%; padding: 4px 6px;",
                onchange: move |e| apply_edit(id, &property, &e.value()),
                for option in options {
                    option {
                        value: "{option.value}",
                        selected: option.value == field.value,
                        "{option.label}"
                    }
                }
            }
        },
        Control::Checkbox | Control::ColumnToggle(_) => rsx! {
            input {
                r#type: "checkbox",
                checked: field.value == "true",
                onchange: move |e| apply_edit(id, &property, &e.checked().to_string()),
            }
        },
        Control::Upload { preview } => rsx! {
            div {
                class: "image-drop-zone",
                style: "padding: 12px; border: 2px dashed #d1d5db; border-radius: 4px; text-align: center;",
                if let Some(src) = preview {
                    img { src: "{src}", style: "max-width: 100%; max-height: 120px; margin-bottom: 8px;" }
                }
                input {
                    r#type: "file",
                    id: UPLOAD_INPUT_ID,
                    accept: "image/*",
                    onchange: move |_| start_upload(id),
                }
            }
        },
        Control::Hint(lines) => rsx! {
            div {
                class: "variable-hint",
                style: "font-size: 11px; color: #6b7280; background: #f9fafb; padding: 8px; border-radius: 4px;",
                div { style: "font-weight: 600; margin-bottom: 4px;", "Type (( to insert a variable" }
                for line in lines {
                    div { "{line}" }
                }
            }
        },
    };

    rsx! {
        div { class: "property-field", style: "margin-bottom: 12px;",
            if !caption.is_empty() {
                label { style: "display: block; font-size: 12px; font-weight: 600; margin-bottom: 4px;", "{caption}" }
            }
            {input}
        }
    }
}

fn queue_edit(id: ElementId, property: &str, value: String) {
    let delay = {
        let mut engine = ENGINE.write();
        let Some(engine) = engine.as_mut() else {
            return;
        };
        engine.queue_property(id, property, value, web::now_ms());
        engine.options().debounce_ms
    };
    spawn(async move {
        web::sleep(delay).await;
        if let Some(engine) = ENGINE.write().as_mut() {
            if let Err(err) = engine.poll_pending(web::now_ms()) {
                tracing::warn!(error = %err, "debounced property failed");
            }
        }
    });
}

fn flush_edit(id: ElementId, property: &str) {
    if let Some(engine) = ENGINE.write().as_mut() {
        if let Err(err) = engine.flush_pending(id, property) {
            tracing::warn!(error = %err, property, "property flush failed");
        }
    }
}

fn apply_edit(id: ElementId, property: &str, value: &str) {
    if let Some(engine) = ENGINE.write().as_mut() {
        if let Err(err) = engine.apply_property(id, property, value) {
            tracing::warn!(error = %err, property, "property change failed");
        }
    }
}

fn delete_element(id: ElementId) {
    if let Some(engine) = ENGINE.write().as_mut() {
        if let Err(err) = engine.delete_element(id) {
            tracing::warn!(error = %err, "delete failed");
        }
    }
}

fn start_upload(id: ElementId) {
    let Some(file) = web::picked_file(UPLOAD_INPUT_ID) else {
        return;
    };
    let Some((ticket, options)) = ENGINE.peek().as_ref().and_then(|engine| {
        engine
            .begin_upload(id)
            .map(|ticket| (ticket, engine.options().clone()))
    }) else {
        return;
    };
    spawn(async move {
        let response = web::upload_image(&options, file).await;
        let finished = match ENGINE.write().as_mut() {
            Some(engine) => engine.finish_upload(ticket, response),
            None => return,
        };
        if let Err(err) = finished {
            report_upload_failure(&err);
        }
    });
}
