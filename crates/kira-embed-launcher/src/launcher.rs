use crate::argv::CArgv;
use crate::error::LaunchError;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

/// Process entry point of an embedded runtime, e.g. `node::Start`.
pub trait RuntimeEntry: Send + Sync + 'static {
    /// Runs the runtime until it exits and returns its exit code.
    fn start(&self, argv: &mut CArgv) -> i32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    Idle,
    Running,
    Exited(i32),
    Failed,
}

/// Launches an embedded runtime at most once per instance. Runtimes such as Node.js
/// cannot be restarted inside the same process, so keep one instance per process.
pub struct EmbeddedRuntime<E: RuntimeEntry> {
    entry: Arc<E>,
    state: Arc<Mutex<LaunchState>>,
}

impl<E: RuntimeEntry> EmbeddedRuntime<E> {
    pub fn new(entry: E) -> Self {
        Self {
            entry: Arc::new(entry),
            state: Arc::new(Mutex::new(LaunchState::Idle)),
        }
    }

    pub fn state(&self) -> LaunchState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts the runtime on the calling thread and blocks until it exits.
    pub fn run<I, S>(&self, args: I) -> Result<i32, LaunchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Vec<u8>>,
    {
        let argv = CArgv::new(args)?;
        self.claim()?;
        launch(&*self.entry, &self.state, argv)
    }

    /// Starts the runtime on a dedicated thread.
    pub fn spawn<I, S>(&self, args: I) -> Result<LaunchHandle, LaunchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Vec<u8>>,
    {
        let argv = CArgv::new(args)?;
        self.claim()?;

        let entry = Arc::clone(&self.entry);
        let state = Arc::clone(&self.state);
        let spawned = std::thread::Builder::new()
            .name("kira-embedded-runtime".to_string())
            .spawn(move || launch(&*entry, &state, argv));
        match spawned {
            Ok(join) => Ok(LaunchHandle { join }),
            Err(e) => {
                set_state(&self.state, LaunchState::Failed);
                Err(LaunchError::SpawnFailed(e))
            }
        }
    }

    fn claim(&self) -> Result<(), LaunchError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match *state {
            LaunchState::Idle => {
                *state = LaunchState::Running;
                Ok(())
            }
            _ => Err(LaunchError::AlreadyStarted),
        }
    }
}

fn set_state(state: &Mutex<LaunchState>, value: LaunchState) {
    *state.lock().unwrap_or_else(PoisonError::into_inner) = value;
}

fn launch<E: RuntimeEntry>(
    entry: &E,
    state: &Mutex<LaunchState>,
    mut argv: CArgv,
) -> Result<i32, LaunchError> {
    log::info!(
        "[launcher] Starting embedded runtime with {} argument(s)",
        argv.argc()
    );
    match catch_unwind(AssertUnwindSafe(|| entry.start(&mut argv))) {
        Ok(code) => {
            log::info!("[launcher] Embedded runtime exited with code {code}");
            set_state(state, LaunchState::Exited(code));
            Ok(code)
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!("[launcher] Embedded runtime panicked: {message}");
            set_state(state, LaunchState::Failed);
            Err(LaunchError::EntryPanicked(message))
        }
    }
}

/// Handle to a runtime started with [`EmbeddedRuntime::spawn`].
pub struct LaunchHandle {
    join: JoinHandle<Result<i32, LaunchError>>,
}

impl LaunchHandle {
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the runtime to exit and returns its exit code.
    pub fn join(self) -> Result<i32, LaunchError> {
        self.join
            .join()
            .unwrap_or(Err(LaunchError::ThreadPanicked))
    }
}
