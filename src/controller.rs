//! Reactive controller between the TUI and the user store.
//!
//! Every command goes through one worker task per controller and runs to
//! completion, trailing reload included, before the next one starts. The
//! observable list is therefore always a snapshot of the store taken after the
//! most recently finished command, never a locally patched copy.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use log::{debug, error, info};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{self, JoinHandle};

use crate::db::{Database, DbError, DbResult};
use crate::models::{NewUser, User};

/// What the UI renders: the latest store snapshot plus the outcome of the
/// last command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsersState {
    pub users: Vec<User>,
    /// Set when a command failed; cleared by the next successful reload.
    pub error: Option<String>,
    /// `true` while commands are queued or running.
    pub busy: bool,
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Store(#[from] DbError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("background task failed: {0}")]
    Worker(String),
}

/// Completion handle for a queued command. Dropping it does not cancel the
/// command.
#[derive(Debug)]
pub struct Ticket(oneshot::Receiver<Result<(), ControllerError>>);

impl Ticket {
    pub async fn wait(self) -> Result<(), ControllerError> {
        self.0.await.unwrap_or(Err(ControllerError::Cancelled))
    }

    /// Block the current thread until the command finished. Must not be called
    /// from inside the async runtime.
    pub fn blocking_wait(self) -> Result<(), ControllerError> {
        self.0.blocking_recv().unwrap_or(Err(ControllerError::Cancelled))
    }
}

enum Command {
    Load,
    Add(NewUser),
    Delete(User),
}

struct Job {
    command: Command,
    done: oneshot::Sender<Result<(), ControllerError>>,
}

/// Shared between the controller and its worker.
struct Shared {
    database: Arc<Database>,
    state: watch::Sender<UsersState>,
    pending: AtomicUsize,
}

impl Shared {
    /// Mark one command as finished. Saturates because `shutdown` may already
    /// have reset the counter while a command was still running.
    fn finish_one(&self) {
        let _ = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)));
        self.refresh_busy();
    }

    fn refresh_busy(&self) {
        self.state.send_if_modified(|state| {
            let busy = self.pending.load(Ordering::SeqCst) > 0;
            let changed = state.busy != busy;
            state.busy = busy;
            changed
        });
    }
}

pub struct UserController {
    shared: Arc<Shared>,
    jobs: mpsc::UnboundedSender<Job>,
    worker: JoinHandle<()>,
    closed: AtomicBool,
}

impl UserController {
    /// Spawn the worker on `runtime` and queue the initial load.
    pub fn new(database: Arc<Database>, runtime: &Handle) -> Self {
        let (state, _) = watch::channel(UsersState::default());
        let shared = Arc::new(Shared {
            database,
            state,
            pending: AtomicUsize::new(0),
        });
        let (jobs, receiver) = mpsc::unbounded_channel();
        let worker = runtime.spawn(run_worker(Arc::clone(&shared), receiver));

        let controller = Self {
            shared,
            jobs,
            worker,
            closed: AtomicBool::new(false),
        };
        let _initial_load = controller.load_users();
        controller
    }

    pub fn subscribe(&self) -> watch::Receiver<UsersState> {
        self.shared.state.subscribe()
    }

    pub fn snapshot(&self) -> UsersState {
        self.shared.state.borrow().clone()
    }

    pub fn users(&self) -> Vec<User> {
        self.shared.state.borrow().users.clone()
    }

    pub fn clear_error(&self) {
        self.shared
            .state
            .send_if_modified(|state| state.error.take().is_some());
    }

    /// Replace the observable list with the store's current rows.
    pub fn load_users(&self) -> Ticket {
        self.submit(Command::Load)
    }

    /// Insert a new user, letting the store assign its id, then reload.
    pub fn add_user(&self, first_name: impl Into<String>, last_name: impl Into<String>) -> Ticket {
        self.submit(Command::Add(NewUser::new(first_name, last_name)))
    }

    /// Remove `user` by primary key, then reload. Deleting a user that is
    /// already gone still succeeds.
    pub fn delete_user(&self, user: User) -> Ticket {
        self.submit(Command::Delete(user))
    }

    /// Stop the worker. Queued commands and every command submitted later
    /// resolve to [`ControllerError::Cancelled`].
    pub fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.worker.abort();
            self.shared.pending.store(0, Ordering::SeqCst);
            self.shared.refresh_busy();
            info!("event=controller_shutdown module=controller status=ok");
        }
    }

    fn submit(&self, command: Command) -> Ticket {
        let (done, receiver) = oneshot::channel();
        if self.closed.load(Ordering::SeqCst) {
            let _ = done.send(Err(ControllerError::Cancelled));
            return Ticket(receiver);
        }

        self.shared.pending.fetch_add(1, Ordering::SeqCst);
        self.shared.refresh_busy();
        if let Err(mpsc::error::SendError(job)) = self.jobs.send(Job { command, done }) {
            self.shared.finish_one();
            let _ = job.done.send(Err(ControllerError::Cancelled));
        }
        Ticket(receiver)
    }
}

impl Drop for UserController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_worker(shared: Arc<Shared>, mut jobs: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = jobs.recv().await {
        let result = execute(&shared, job.command).await;
        if let Err(err) = &result {
            let message = err.to_string();
            shared
                .state
                .send_modify(|state| state.error = Some(message));
        }

        shared.finish_one();
        let _ = job.done.send(result);
    }
}

async fn execute(shared: &Shared, command: Command) -> Result<(), ControllerError> {
    match command {
        Command::Load => {}
        Command::Add(new_user) => {
            let database = Arc::clone(&shared.database);
            match run_blocking(move || database.create_user(&new_user)).await {
                Ok(user) => info!(
                    "event=user_insert module=controller status=ok id={} user={:?}",
                    user.id, user
                ),
                Err(err) => {
                    error!("event=user_insert module=controller status=error error={err}");
                    return Err(err);
                }
            }
        }
        Command::Delete(user) => {
            let database = Arc::clone(&shared.database);
            let id = user.id;
            match run_blocking(move || database.delete_user(id)).await {
                Ok(removed) => info!(
                    "event=user_delete module=controller status=ok id={id} removed={removed} user={user:?}"
                ),
                Err(err) => {
                    error!("event=user_delete module=controller status=error id={id} error={err}");
                    return Err(err);
                }
            }
        }
    }

    reload(shared).await
}

async fn reload(shared: &Shared) -> Result<(), ControllerError> {
    let database = Arc::clone(&shared.database);
    match run_blocking(move || database.fetch_users()).await {
        Ok(users) => {
            debug!(
                "event=users_load module=controller status=ok count={} users={:?}",
                users.len(),
                users
            );
            shared.state.send_modify(|state| {
                state.users = users;
                state.error = None;
            });
            Ok(())
        }
        Err(err) => {
            error!("event=users_load module=controller status=error error={err}");
            Err(err)
        }
    }
}

/// Run a store call on the blocking pool so the worker never stalls the
/// runtime on SQLite I/O.
async fn run_blocking<T, F>(f: F) -> Result<T, ControllerError>
where
    F: FnOnce() -> DbResult<T> + Send + 'static,
    T: Send + 'static,
{
    match task::spawn_blocking(f).await {
        Ok(result) => result.map_err(ControllerError::from),
        Err(err) if err.is_cancelled() => Err(ControllerError::Cancelled),
        Err(err) => Err(ControllerError::Worker(err.to_string())),
    }
}
