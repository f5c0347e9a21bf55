/// Dashboard building blocks

use crate::tab_data::TabId;
use crate::ui::reconcile::ColumnView;
use patternfly_yew::prelude::*;
use web_sys::{Element, ScrollIntoViewOptions, ScrollLogicalPosition};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct LogColumnProps {
    pub column: ColumnView,
    #[prop_or(false)]
    pub flashing: bool,
    #[prop_or(false)]
    pub focused: bool,
    pub on_copy: Callback<TabId>,
    pub on_remove: Callback<TabId>,
}

/// One tab's log: header, entries and per-column actions
#[function_component(LogColumn)]
pub fn log_column(props: &LogColumnProps) -> Html {
    let root_ref = use_node_ref();
    let output_ref = use_node_ref();
    let column = &props.column;

    // Keep the newest entry in view when the entry count changes
    {
        let output_ref = output_ref.clone();
        use_effect_with(column.count, move |_| {
            if let Some(output) = output_ref.cast::<Element>() {
                output.set_scroll_top(output.scroll_height());
            }
            || ()
        });
    }

    {
        let root_ref = root_ref.clone();
        use_effect_with(props.focused, move |focused| {
            if *focused {
                if let Some(root) = root_ref.cast::<Element>() {
                    let options = ScrollIntoViewOptions::new();
                    options.set_block(ScrollLogicalPosition::Nearest);
                    options.set_inline(ScrollLogicalPosition::Nearest);
                    root.scroll_into_view_with_scroll_into_view_options(&options);
                }
            }
            || ()
        });
    }

    let tab_id = column.tab_id;
    let mut classes = classes!("log-column");
    if props.flashing {
        classes.push("flash");
    }
    if props.focused {
        classes.push("focused");
    }

    html! {
        <div ref={root_ref} class={classes} data-tab-id={tab_id.to_string()}>
            <div class="column-header">
                <div class="column-title">
                    <span class="title-text">{&column.title}</span>
                    <span class="entry-count">{format!(" ({})", column.count)}</span>
                </div>
                <div class="column-url" title={column.url.clone()}>{&column.url}</div>
                <div class="column-actions">
                    <Button
                        onclick={props.on_copy.reform(move |_| tab_id)}
                        variant={ButtonVariant::Secondary}
                        size={ButtonSize::Small}
                    >
                        {"Copy"}
                    </Button>
                    <Button
                        onclick={props.on_remove.reform(move |_| tab_id)}
                        variant={ButtonVariant::Danger}
                        size={ButtonSize::Small}
                    >
                        {"Remove"}
                    </Button>
                </div>
            </div>
            <pre ref={output_ref} class="log-output">{column.body.clone()}</pre>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct StatsLineProps {
    pub text: String,
    #[prop_or_default]
    pub error: Option<String>,
}

#[function_component(StatsLine)]
pub fn stats_line(props: &StatsLineProps) -> Html {
    html! {
        <div class="stats">
            <span class="stats-text">{&props.text}</span>
            if let Some(err) = &props.error {
                <Alert r#type={AlertType::Warning} title={err.clone()} inline={true}>
                </Alert>
            }
        </div>
    }
}
