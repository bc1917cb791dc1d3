//! Binary entry point: bring up logging and the database, seed a fresh store,
//! then drive the Ratatui event loop while the controller does its work on a
//! background runtime.
use anyhow::Context;
use log::info;
use user_roster::{
    get_database, logging, run_app, seed_sample_user, App, AppConfig, UserController,
};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_home()?;
    logging::init_logging(&config.log_level, &config.log_dir())?;

    let database = get_database(&config).context("failed to open user database")?;
    let users = database.with_conn(seed_sample_user)?;
    info!("event=startup module=main status=ok users={}", users.len());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start background runtime")?;

    let controller = UserController::new(database, runtime.handle());
    let mut app = App::new(controller);
    let result = run_app(&mut app);
    app.shutdown();
    result
}
