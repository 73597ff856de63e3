//! Per-row actions and their dispatch rules

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;

use kubedeck_types::ResourceItem;

use crate::confirm::{ConfirmVariant, Prompt};
use crate::error::{ConsoleError, ConsoleResult};
use crate::feedback::FeedbackLabels;
use crate::ops::{ApiFuture, DeleteMode};

/// Visual weight of a row control
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActionVariant {
    #[default]
    Neutral,
    Primary,
    Danger,
}

/// Extra input handed to an action when it runs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActionContext {
    pub force: bool,
}

impl ActionContext {
    pub fn delete_mode(&self) -> DeleteMode {
        DeleteMode::from_force(self.force)
    }
}

pub type ActionFn<T> = Arc<dyn Fn(T, ActionContext) -> ApiFuture<()> + Send + Sync>;
pub type ItemPredicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// One per-row action
pub struct ActionDef<T> {
    pub key: &'static str,
    pub icon: &'static str,
    pub hotkey: Option<char>,
    pub tooltip: Option<String>,
    pub variant: ActionVariant,
    /// Destructive: always goes through the confirmation dialog
    pub danger: bool,
    pub force_option: bool,
    /// Labels may contain `{name}`
    pub labels: FeedbackLabels,
    /// Dialog title and description; may contain `{name}` and `{namespace}`
    pub confirm_text: Option<(String, String)>,
    pub refresh_after: bool,
    pub on_click: ActionFn<T>,
    pub visible: Option<ItemPredicate<T>>,
    pub disabled: Option<ItemPredicate<T>>,
}

impl<T> Clone for ActionDef<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            icon: self.icon,
            hotkey: self.hotkey,
            tooltip: self.tooltip.clone(),
            variant: self.variant,
            danger: self.danger,
            force_option: self.force_option,
            labels: self.labels.clone(),
            confirm_text: self.confirm_text.clone(),
            refresh_after: self.refresh_after,
            on_click: Arc::clone(&self.on_click),
            visible: self.visible.clone(),
            disabled: self.disabled.clone(),
        }
    }
}

impl<T: ResourceItem> ActionDef<T> {
    pub fn new<F, Fut>(key: &'static str, icon: &'static str, on_click: F) -> Self
    where
        F: Fn(T, ActionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), kubedeck_types::ApiError>> + Send + 'static,
    {
        Self {
            key,
            icon,
            hotkey: None,
            tooltip: None,
            variant: ActionVariant::Neutral,
            danger: false,
            force_option: false,
            labels: FeedbackLabels::new(
                format!("Running {} on {{name}}", key),
                format!("{} done for {{name}}", key),
                format!("Failed to {} {{name}}", key),
            ),
            confirm_text: None,
            refresh_after: true,
            on_click: Arc::new(move |item: T, ctx: ActionContext| on_click(item, ctx).boxed()),
            visible: None,
            disabled: None,
        }
    }

    pub fn hotkey(mut self, key: char) -> Self {
        self.hotkey = Some(key);
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn variant(mut self, variant: ActionVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Mark destructive; implies the danger variant
    pub fn danger(mut self) -> Self {
        self.danger = true;
        self.variant = ActionVariant::Danger;
        self
    }

    pub fn force_option(mut self) -> Self {
        self.force_option = true;
        self
    }

    pub fn labels(mut self, labels: FeedbackLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn confirm_text(
        mut self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.confirm_text = Some((title.into(), description.into()));
        self
    }

    pub fn refresh_after(mut self, refresh: bool) -> Self {
        self.refresh_after = refresh;
        self
    }

    pub fn visible_when<P>(mut self, pred: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.visible = Some(Arc::new(pred));
        self
    }

    pub fn disabled_when<P>(mut self, pred: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.disabled = Some(Arc::new(pred));
        self
    }

    pub fn is_visible(&self, item: &T) -> bool {
        self.visible.as_ref().is_none_or(|pred| pred(item))
    }

    pub fn is_disabled(&self, item: &T) -> bool {
        self.disabled.as_ref().is_some_and(|pred| pred(item))
    }

    pub fn run(&self, item: T, ctx: ActionContext) -> ApiFuture<()> {
        (self.on_click)(item, ctx)
    }

    /// Confirmation prompt for this action on `item`
    pub fn prompt_for(&self, item: &T) -> Prompt {
        let fill = |s: &str| {
            s.replace("{name}", item.name())
                .replace("{namespace}", item.namespace())
        };
        let (title, description) = match &self.confirm_text {
            Some((title, description)) => (fill(title), fill(description)),
            None => (
                format!("{}?", capitalize(self.key)),
                format!("{} {}? This cannot be undone.", capitalize(self.key), item.name()),
            ),
        };
        let variant = match self.variant {
            ActionVariant::Danger => ConfirmVariant::Danger,
            _ => ConfirmVariant::Warning,
        };
        Prompt::new(title, description)
            .variant(variant)
            .force_option(self.force_option)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Render-ready description of one control on one row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowControl {
    pub key: &'static str,
    pub icon: &'static str,
    pub hotkey: Option<char>,
    pub tooltip: Option<String>,
    pub variant: ActionVariant,
    pub danger: bool,
    pub enabled: bool,
}

/// Controls to render for `item`; hidden actions are omitted
pub fn controls_for<T: ResourceItem>(actions: &[ActionDef<T>], item: &T) -> Vec<RowControl> {
    actions
        .iter()
        .filter(|action| action.is_visible(item))
        .map(|action| RowControl {
            key: action.key,
            icon: action.icon,
            hotkey: action.hotkey,
            tooltip: action.tooltip.clone(),
            variant: action.variant,
            danger: action.danger,
            enabled: !action.is_disabled(item),
        })
        .collect()
}

/// How a triggered action proceeds
#[derive(Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Run now, wrapped in feedback
    Run,
    /// Open the confirmation dialog first
    Confirm(Prompt),
}

/// Resolve a trigger of `key` on `item`
pub fn dispatch<'a, T: ResourceItem>(
    actions: &'a [ActionDef<T>],
    key: &str,
    item: &T,
) -> ConsoleResult<(&'a ActionDef<T>, Dispatch)> {
    let action = actions
        .iter()
        .find(|a| a.key == key)
        .ok_or_else(|| ConsoleError::UnknownAction(key.to_string()))?;

    if !action.is_visible(item) {
        return Err(ConsoleError::ActionHidden(key.to_string()));
    }
    if action.is_disabled(item) {
        return Err(ConsoleError::ActionDisabled(key.to_string()));
    }

    if action.danger {
        Ok((action, Dispatch::Confirm(action.prompt_for(item))))
    } else {
        Ok((action, Dispatch::Run))
    }
}
