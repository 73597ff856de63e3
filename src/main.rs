mod config;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use kubedeck_console::{
    Access, AuditLog, BatchVerb, ConsoleContext, ConsoleView, DynEvent, DynTask, Notice,
    NotificationCenter, NotificationSink, RoleRequirement, Session, UserInfo, gate,
    parse_label_spec,
};
use kubedeck_k8s::{KubeClient, open_console};
use kubedeck_tui::{
    Action, AppState, AuditLogScreen, ClusterSelectScreen, ConfirmDialog, ErrorPopup, Event,
    EventHandler, HelpOverlay, InputMode, KeyBindings, KeyContext, NamespacePicker,
    ResourceListScreen, Screen, TextPrompt, Toasts, Tui,
};
use kubedeck_types::{ClusterId, ResourceKind, UserMessage};

use crate::config::Config;

/// Kubedeck - A terminal admin console for Kubernetes workloads and RBAC objects
#[derive(Parser, Debug)]
#[command(name = "kubedeck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cluster to open, by id (kubeconfig position, from 1) or context name
    #[arg(short, long)]
    cluster: Option<String>,

    /// Namespace to open
    #[arg(short, long)]
    namespace: Option<String>,

    /// Resource kind to open (deployments, pods, roles, ...)
    #[arg(short, long)]
    kind: Option<ResourceKind>,

    /// User name for the session (defaults to $USER)
    #[arg(long)]
    user: Option<String>,

    /// Session role; may be repeated
    #[arg(long = "role")]
    roles: Vec<String>,

    /// Path to config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.log_file.as_deref())?;

    let config = Config::load(args.config.as_deref())?;

    // Run the application
    let result = run_app(args, config).await;

    // Handle any errors
    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

/// Internal actions for async operations
enum InternalAction {
    /// A console task finished; `serial` identifies the console that started it
    Console { serial: u64, event: DynEvent },
}

/// Long-lived collaborators of the event loop
struct Runtime {
    client: KubeClient,
    ctx: ConsoleContext,
    policy: RoleRequirement,
    default_kind: ResourceKind,
    ttl: chrono::Duration,
    internal_tx: mpsc::UnboundedSender<InternalAction>,
}

impl Runtime {
    /// Open the console for `kind`, or `None` when the session may not see it
    fn open(&self, kind: ResourceKind) -> Option<Box<dyn ConsoleView>> {
        let console = open_console(kind, &self.client, self.ctx.clone());
        match gate(&self.ctx.session, &self.policy, console.admin_only()) {
            Access::Granted => Some(console),
            Access::Redirect => {
                debug!(kind = %kind, "view not authorized");
                None
            }
        }
    }

    /// Open `kind`, redirecting to the default kind when it is not authorized
    fn open_or_default(&self, kind: ResourceKind) -> (ResourceKind, Box<dyn ConsoleView>) {
        match self.open(kind) {
            Some(console) => (kind, console),
            None => (
                self.default_kind,
                open_console(self.default_kind, &self.client, self.ctx.clone()),
            ),
        }
    }

    /// Run console tasks in the background, tagging results with the console serial
    fn spawn(&self, serial: u64, tasks: Vec<DynTask>) {
        for task in tasks {
            let tx = self.internal_tx.clone();
            tokio::spawn(async move {
                let event = task.await;
                let _ = tx.send(InternalAction::Console { serial, event });
            });
        }
    }

    fn notify_error(&self, state: &AppState, message: impl Into<String>) {
        state.notices.publish(Notice::error(message));
    }
}

async fn run_app(args: Args, config: Config) -> Result<()> {
    // Create action channels
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (internal_tx, mut internal_rx) = mpsc::unbounded_channel::<InternalAction>();

    // Load kubeconfig and clusters
    let client = KubeClient::new()?;

    let explicit_cluster = match &args.cluster {
        Some(raw) => Some(resolve_cli_cluster(&client, raw)?),
        None => None,
    };

    // Log in
    let user = args
        .user
        .clone()
        .or_else(|| config.session.user.clone())
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "anonymous".to_string());
    let roles = if args.roles.is_empty() {
        config.session.roles.clone()
    } else {
        args.roles.clone()
    };
    let session = Session::login(UserInfo::new(user, roles));

    let notices = Arc::new(NotificationCenter::default());
    let audit = AuditLog::new(config.console.audit_capacity());
    let ctx = ConsoleContext {
        session: session.clone(),
        notifier: notices.clone(),
        audit: audit.clone(),
    };

    let mut runtime = Runtime {
        client,
        ctx,
        policy: RoleRequirement::new(config.access.admin_role.clone()),
        default_kind: ResourceKind::Deployments,
        ttl: config.console.notification_ttl(),
        internal_tx,
    };

    // An admin-only default would redirect to itself
    if runtime.open(config.console.default_kind).is_some() {
        runtime.default_kind = config.console.default_kind;
    } else {
        warn!(
            kind = %config.console.default_kind,
            "default kind is not authorized for this session"
        );
    }

    let requested = args.kind.unwrap_or(runtime.default_kind);
    let (kind, console) = runtime.open_or_default(requested);

    // Initialize state
    let mut state = AppState::new(action_tx.clone(), session.clone(), kind, console);
    state.notices = notices;
    state.audit = audit;
    state.clusters = runtime.client.clusters().to_vec();
    state.active_cluster = runtime.client.current_cluster();
    state.explicit_cluster = explicit_cluster;

    // Start on the table when a cluster is known, otherwise ask for one
    let context = state.cluster_context();
    if !context.is_unset() {
        state.navigate_to(Screen::ResourceList);
    }
    let mut tasks = state.console.select_cluster(context);
    if let Some(namespace) = &args.namespace {
        tasks.extend(state.console.select_namespace(Some(namespace.clone())));
    }
    runtime.spawn(state.console_serial, tasks);

    // Initialize TUI
    let mut tui = Tui::new()?;

    // Initialize event handler
    let mut events = EventHandler::new(config.console.tick_rate());

    // Initialize keybindings
    let keybindings = KeyBindings::new();

    // Initial render
    render(&mut tui, &mut state, runtime.ttl)?;

    // Main event loop
    loop {
        tokio::select! {
            // Handle terminal events
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        if let Some(action) = key_action(&keybindings, &state, &key) {
                            let _ = action_tx.send(action);
                        }
                    }
                    Event::Tick => {
                        let _ = action_tx.send(Action::Tick);
                    }
                    Event::Resize(_, _) => {
                        let _ = action_tx.send(Action::Render);
                    }
                    Event::Error(e) => {
                        state.show_error(e);
                        state.render_dirty = true;
                    }
                }
            }

            // Handle user actions
            Some(action) = action_rx.recv() => {
                if action != Action::Tick {
                    state.render_dirty = true;
                }
                handle_action(&mut state, &runtime, action);
            }

            // Handle completed console tasks
            Some(internal) = internal_rx.recv() => {
                match internal {
                    InternalAction::Console { serial, event } => {
                        if serial == state.console_serial {
                            let tasks = state.console.handle(event);
                            runtime.spawn(serial, tasks);
                            state.clamp_table_selection();
                            state.render_dirty = true;
                        } else {
                            debug!(
                                serial,
                                current = state.console_serial,
                                "dropping result of a replaced console"
                            );
                        }
                    }
                }
            }
        }

        if state.should_quit {
            break;
        }

        if state.render_dirty {
            render(&mut tui, &mut state, runtime.ttl)?;
            state.render_dirty = false;
        }
    }

    // Cleanup
    events.shutdown().await;
    tui.restore()?;
    session.logout();

    Ok(())
}

/// Map `--cluster` to a cluster id string. Context or cluster names are
/// looked up in the kubeconfig.
fn resolve_cli_cluster(client: &KubeClient, raw: &str) -> Result<String> {
    let id: Option<ClusterId> = match raw.parse::<ClusterId>() {
        Ok(id) => client.cluster(id).map(|c| c.id),
        Err(_) => client.find_cluster(raw),
    };
    match id {
        Some(id) => Ok(id.to_string()),
        None => anyhow::bail!("Cluster '{}' not found in kubeconfig", raw),
    }
}

/// Translate a key press into an action for whatever currently has focus
fn key_action(
    keybindings: &KeyBindings,
    state: &AppState,
    key: &crossterm::event::KeyEvent,
) -> Option<Action> {
    if state.ui_state.error_message.is_some() {
        return Some(Action::DismissError);
    }
    if state.ui_state.help_visible {
        return Some(Action::ToggleHelp);
    }
    if state.console.prompt().is_some() {
        return keybindings.get_action(KeyContext::Dialog, key);
    }
    if state.ui_state.input_mode != InputMode::Normal {
        return keybindings.get_text_input_action(state.ui_state.input_mode, key);
    }
    if state.ui_state.namespace_picker.is_some() {
        return keybindings.get_action(KeyContext::ListNavigation, key);
    }

    match state.current_screen {
        Screen::ClusterSelect | Screen::AuditLog => {
            keybindings.get_action(KeyContext::ListNavigation, key)
        }
        Screen::ResourceList => keybindings.get_resource_list_action(key),
    }
}

fn handle_action(state: &mut AppState, runtime: &Runtime, action: Action) {
    match action {
        Action::Quit => {
            state.should_quit = true;
        }
        Action::GoBack => {
            if state.ui_state.namespace_picker.take().is_none() && !state.go_back() {
                // Nothing to go back to from the table
                if state.current_screen == Screen::ClusterSelect {
                    state.should_quit = true;
                }
            }
        }
        Action::Navigate(screen) => {
            state.navigate_to(screen);
        }

        Action::SelectCluster(id) => {
            info!(cluster = id, "cluster selected");
            // A choice made in the UI replaces the command-line override
            state.explicit_cluster = None;
            state.active_cluster = Some(id);
            let tasks = state.console.select_cluster(state.cluster_context());
            runtime.spawn(state.console_serial, tasks);
            state.ui_state.table_state.select(Some(0));
            if state.current_screen == Screen::ClusterSelect {
                if state.screen_stack.last() == Some(&Screen::ResourceList) {
                    state.go_back();
                } else {
                    state.navigate_to(Screen::ResourceList);
                }
            }
        }
        Action::SelectNamespace(namespace) => {
            state.ui_state.namespace_picker = None;
            let tasks = state.console.select_namespace(namespace);
            runtime.spawn(state.console_serial, tasks);
            state.ui_state.table_state.select(Some(0));
        }
        Action::SwitchKind(kind) => {
            let (kind, console) = runtime.open_or_default(kind);
            switch_console(state, runtime, kind, console);
        }
        Action::NextKind | Action::PrevKind => {
            let mut kind = state.kind;
            for _ in 0..ResourceKind::ALL.len() {
                kind = if action == Action::NextKind {
                    kind.next()
                } else {
                    kind.prev()
                };
                if let Some(console) = runtime.open(kind) {
                    switch_console(state, runtime, kind, console);
                    break;
                }
            }
        }

        Action::ToggleHelp => {
            state.ui_state.help_visible = !state.ui_state.help_visible;
        }
        Action::OpenNamespacePicker => {
            if state.cluster_context().is_unset() {
                runtime.notify_error(state, "Select a cluster first");
            } else {
                state.open_namespace_picker();
            }
        }
        Action::ShowAuditLog => {
            // Unauthorized users are simply not taken there
            if gate(&runtime.ctx.session, &runtime.policy, true) == Access::Granted {
                state.navigate_to(Screen::AuditLog);
            }
        }

        Action::ListUp => state.list_up(),
        Action::ListDown => state.list_down(),
        Action::ListTop => state.list_top(),
        Action::ListBottom => state.list_bottom(),
        Action::ListSelect => handle_list_select(state),

        Action::OpenSearch => state.start_search(),
        Action::CloseSearch => state.cancel_search(),
        Action::ApplySearch => state.apply_search(),
        Action::SearchInput(c) => state.search_input_char(c),
        Action::SearchBackspace => state.search_input_backspace(),
        Action::SearchClear => state.search_clear(),

        Action::ToggleRow => {
            if let Some(idx) = state.ui_state.table_state.selected() {
                state.console.toggle_row(idx);
                state.list_down();
            }
        }
        Action::ToggleAll => state.console.toggle_all(),
        Action::ClearSelection => state.console.clear_selection(),
        Action::SortColumn(column) => {
            state.console.sort_by_column(column);
        }
        Action::CycleStatusFilter => {
            state.console.cycle_status_filter();
            state.clamp_table_selection();
        }
        Action::RowAction(hotkey) => {
            let Some(idx) = state.ui_state.table_state.selected() else {
                return;
            };
            match state.console.trigger_hotkey(hotkey, idx) {
                Some(Ok(tasks)) => runtime.spawn(state.console_serial, tasks),
                Some(Err(e)) => runtime.notify_error(state, e.user_message()),
                None => {}
            }
        }
        Action::Refresh => {
            let tasks = state.console.refresh();
            runtime.spawn(state.console_serial, tasks);
        }

        Action::BatchDelete => request_batch(state, runtime, BatchVerb::Delete),
        Action::BatchRestart => request_batch(state, runtime, BatchVerb::Restart),
        Action::OpenLabelPrompt => {
            if !state.console.batch_support().label {
                runtime.notify_error(
                    state,
                    format!("Labeling is not supported for {}", state.console.title()),
                );
            } else if state.console.selected_count() == 0 {
                runtime.notify_error(state, "Select at least one row to label");
            } else {
                state.start_label_prompt();
            }
        }
        Action::LabelInput(c) => {
            state.ui_state.label_input.push(c);
            state.ui_state.label_error = None;
        }
        Action::LabelBackspace => {
            state.ui_state.label_input.pop();
            state.ui_state.label_error = None;
        }
        Action::SubmitLabel => match parse_label_spec(&state.ui_state.label_input) {
            Ok(labels) => {
                state.close_label_prompt();
                request_batch(state, runtime, BatchVerb::Label(labels));
            }
            Err(e) => {
                state.ui_state.label_error = Some(e.to_string());
            }
        },
        Action::CancelLabel => state.close_label_prompt(),

        Action::DialogConfirm => {
            let tasks = state.console.confirm();
            runtime.spawn(state.console_serial, tasks);
        }
        Action::DialogCancel => {
            state.console.cancel_confirmation();
        }
        Action::DialogToggleForce => {
            state.console.toggle_force();
        }

        Action::DismissNotice => {
            state.notices.dismiss_latest();
        }
        Action::ShowError(msg) => state.show_error(msg),
        Action::DismissError => state.dismiss_error(),

        Action::Tick => {
            let now = Utc::now();
            state.notices.prune(now, runtime.ttl);
            // Keep toasts and the loading marker moving
            if !state.notices.is_empty() || state.console.is_loading() {
                state.render_dirty = true;
            }
        }
        Action::Render => {
            state.render_dirty = true;
        }
    }
}

fn handle_list_select(state: &mut AppState) {
    let Some(idx) = state.selected_index() else {
        return;
    };

    if state.ui_state.namespace_picker.is_some() {
        if let Some(namespace) = state.namespace_options().get(idx).cloned() {
            let _ = state.action_tx.send(Action::SelectNamespace(namespace));
        }
        return;
    }

    if state.current_screen == Screen::ClusterSelect {
        if let Some(cluster) = state.clusters.get(idx) {
            let _ = state.action_tx.send(Action::SelectCluster(cluster.id));
        }
    }
}

fn request_batch(state: &mut AppState, runtime: &Runtime, verb: BatchVerb) {
    if let Err(e) = state.console.request_batch(verb) {
        runtime.notify_error(state, e.user_message());
    }
}

/// Replace the console, carrying the cluster and namespace over
fn switch_console(
    state: &mut AppState,
    runtime: &Runtime,
    kind: ResourceKind,
    console: Box<dyn ConsoleView>,
) {
    if kind == state.kind {
        return;
    }
    let namespace = state.console.scope().namespace;
    let serial = state.replace_console(kind, console);
    let mut tasks = state.console.select_cluster(state.cluster_context());
    if namespace.is_some() {
        tasks.extend(state.console.select_namespace(namespace));
    }
    runtime.spawn(serial, tasks);
}

fn render(tui: &mut Tui, state: &mut AppState, ttl: chrono::Duration) -> Result<()> {
    let notices = state.notices.visible(Utc::now(), ttl);

    tui.draw(|frame| {
        match state.current_screen {
            Screen::ClusterSelect => ClusterSelectScreen::render(frame, state),
            Screen::ResourceList => ResourceListScreen::render(frame, state),
            Screen::AuditLog => AuditLogScreen::render(frame, state),
        }

        if state.ui_state.namespace_picker.is_some() {
            NamespacePicker::render(frame, state);
        }

        if state.ui_state.input_mode == InputMode::Label {
            let title = format!("Label {} selected", state.console.selected_count());
            TextPrompt::new(&title, &state.ui_state.label_input)
                .hint("key=value[,key=value...]  Enter to apply, Esc to cancel")
                .error(state.ui_state.label_error.as_deref())
                .render(frame);
        }

        if let Some(prompt) = state.console.prompt() {
            ConfirmDialog::new(prompt, state.console.confirm_phase(), state.console.force())
                .render(frame);
        }

        Toasts::new(&notices).render(frame);

        // Render help overlay if visible
        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }

        if let Some(message) = &state.ui_state.error_message {
            ErrorPopup::new(message).render(frame);
        }
    })?;

    Ok(())
}
