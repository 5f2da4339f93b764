use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use harvest_core::{update, AppState, Msg};
use harvest_engine::EngineHandle;
use harvest_logging::{harvest_debug, harvest_info, harvest_warn};

use super::commands::{parse_command, Command, HELP};
use super::config::{load_config, AppConfig, DEFAULT_CONFIG_FILE};
use super::console::Console;
use super::effects::EffectRunner;
use super::logging;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

enum Input {
    Command(Command),
    Invalid(String),
    Closed,
}

pub fn run_app() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let loaded = load_config(&config_path);
    let app_config = match &loaded {
        Ok(Some(config)) => config.clone(),
        _ => AppConfig::default(),
    };

    logging::initialize(&app_config.log);
    match &loaded {
        Ok(Some(_)) => harvest_info!("Loaded configuration from {}", config_path.display()),
        Ok(None) => harvest_info!("No configuration at {}; using defaults", config_path.display()),
        Err(err) => harvest_warn!("Ignoring configuration: {}", err),
    }

    let mut console = Console::stdout();
    if let Err(err) = &loaded {
        console.raw(&format!("Ignoring configuration: {err}\n"));
    }

    let runner = EffectRunner::new(EngineHandle::new(app_config.engine_config()));
    let mut app = App {
        state: AppState::new(),
        runner,
        console,
    };
    if let Some(dir) = &app_config.output_dir {
        app.dispatch(Msg::OutputDirChanged(dir.display().to_string()));
    }

    app.console.raw("story_harvest ready. Type 'help' for commands.\n");
    let input_rx = spawn_input_reader()?;

    loop {
        while let Some(msg) = app.runner.poll(&mut app.console) {
            app.dispatch(msg);
        }

        match input_rx.recv_timeout(POLL_INTERVAL) {
            Ok(Input::Command(Command::Quit)) | Ok(Input::Closed) => break,
            Ok(Input::Command(command)) => app.handle_command(command),
            Ok(Input::Invalid(message)) => app.console.raw(&format!("{message}\n")),
            Err(mpsc::RecvTimeoutError::Timeout) => app.dispatch(Msg::Tick),
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    if app.state.is_running() {
        harvest_warn!("Exiting with a harvest still running");
    }
    harvest_info!("story_harvest exiting");
    Ok(())
}

struct App<W: Write> {
    state: AppState,
    runner: EffectRunner,
    console: Console<W>,
}

impl<W: Write> App<W> {
    fn handle_command(&mut self, command: Command) {
        match command {
            Command::MetadataUrl(url) => self.dispatch(Msg::MetadataUrlChanged(url)),
            Command::ChapterUrl(url) => self.dispatch(Msg::ChapterUrlChanged(url)),
            Command::OutputDir(dir) => self.dispatch(Msg::OutputDirChanged(dir)),
            Command::Start(urls) => {
                if let Some((metadata_url, chapter_url)) = urls {
                    self.dispatch(Msg::MetadataUrlChanged(metadata_url));
                    self.dispatch(Msg::ChapterUrlChanged(chapter_url));
                }
                self.dispatch(Msg::StartClicked);
            }
            Command::TogglePause => self.dispatch(Msg::PauseToggled),
            Command::Render => self.dispatch(Msg::RenderClicked),
            Command::Status => {
                let view = self.state.view();
                self.console.status(&view);
            }
            Command::Help => self.console.raw(HELP),
            Command::Quit => {}
        }
    }

    /// Feeds `msg` through `update` and runs the resulting effects, including
    /// any follow-up messages they produce.
    fn dispatch(&mut self, msg: Msg) {
        let mut pending = VecDeque::from([msg]);
        while let Some(msg) = pending.pop_front() {
            let (state, effects) = update(std::mem::take(&mut self.state), msg);
            self.state = state;
            for effect in effects {
                if let Some(follow_up) = self.runner.run(effect, &mut self.console) {
                    pending.push_back(follow_up);
                }
            }
        }
        if self.state.consume_dirty() {
            harvest_debug!("State now {:?}", self.state.view().stage);
        }
    }
}

fn spawn_input_reader() -> anyhow::Result<mpsc::Receiver<Input>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let input = match parse_command(&line) {
                    Ok(command) => Input::Command(command),
                    Err(err) => Input::Invalid(err.to_string()),
                };
                if tx.send(input).is_err() {
                    return;
                }
            }
            let _ = tx.send(Input::Closed);
        })?;
    Ok(rx)
}
