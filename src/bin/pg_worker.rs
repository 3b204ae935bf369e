//! Runs embedded `PostgreSQL` lifecycle operations for the integration tests
//! on behalf of a privileged test runner.
//!
//! Usage:
//!
//! ```text
//! pg_worker <setup|start|stop> <config-path>
//! ```
//!
//! `config-path` names a JSON worker payload produced by
//! `pg-embed-setup-unpriv`, carrying the cluster settings and environment
//! overrides. When started as root the worker re-executes itself as `nobody`
//! before touching the data directory, because `PostgreSQL` refuses to run as
//! root.

#[cfg(unix)]
use camino::Utf8Path;
#[cfg(unix)]
use nix::unistd::{Uid, User, initgroups, setgid, setuid};
#[cfg(unix)]
use pg_embedded_setup_unpriv::ambient_dir_and_path;
#[cfg(unix)]
use pg_embedded_setup_unpriv::worker::{PlainSecret, WorkerPayload};
#[cfg(unix)]
use postgresql_embedded::{PostgreSQL, Status};
#[cfg(unix)]
use readytodo::worker::{
    LifecycleOperation, WORKER_REEXEC_ENV, WorkerArgsError, parse_worker_args,
    reexec_shell_command,
};
#[cfg(unix)]
use std::env;
#[cfg(unix)]
use std::ffi::CString;
#[cfg(unix)]
use std::io::{self, Read};
#[cfg(unix)]
use std::process::{Command, ExitStatus};
#[cfg(unix)]
use thiserror::Error;

#[cfg(unix)]
const TRUSTED_PATH: &str = "/usr/sbin:/usr/bin:/sbin:/bin";
#[cfg(unix)]
const UNPRIVILEGED_USER: &str = "nobody";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[cfg(unix)]
#[derive(Debug, Error)]
enum WorkerError {
    #[error("invalid arguments: {0}")]
    Args(#[from] WorkerArgsError),
    #[error("argument is not valid UTF-8")]
    NonUtf8Argument,
    #[error("failed to read worker config: {0}")]
    ConfigRead(#[source] BoxError),
    #[error("failed to parse worker config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("settings conversion failed: {0}")]
    SettingsConversion(String),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] io::Error),
    #[error("failed to drop privileges: {0}")]
    PrivilegeDrop(String),
    #[error("postgres {operation} failed: {message}")]
    Postgres {
        operation: LifecycleOperation,
        message: String,
    },
}

#[cfg(unix)]
fn main() -> Result<(), BoxError> {
    let args = collect_args()?;
    maybe_reexec_unprivileged(&args)?;
    run(&args).map_err(Into::into)
}

#[cfg(unix)]
fn collect_args() -> Result<Vec<String>, WorkerError> {
    env::args_os()
        .skip(1)
        .map(|arg| arg.into_string().map_err(|_| WorkerError::NonUtf8Argument))
        .collect()
}

#[cfg(unix)]
fn run(args: &[String]) -> Result<(), WorkerError> {
    let invocation = parse_worker_args(args.iter().cloned())?;
    let payload = load_payload(Utf8Path::new(&invocation.config_path))?;
    drop_privileges_if_root(UNPRIVILEGED_USER)?;
    let settings = payload
        .settings
        .into_settings()
        .map_err(|err| WorkerError::SettingsConversion(err.to_string()))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(WorkerError::RuntimeInit)?;
    apply_environment(&payload.environment);

    let operation = invocation.operation;
    let mut postgres = PostgreSQL::new(settings);
    runtime.block_on(async {
        match operation {
            LifecycleOperation::Setup => {
                postgres
                    .setup()
                    .await
                    .map_err(|err| postgres_failure(operation, &err))?;
                ensure_started(&mut postgres, operation).await
            }
            LifecycleOperation::Start => {
                ensure_started(&mut postgres, operation).await?;
                // Dropping the handle would stop the server it just started.
                std::mem::forget(postgres);
                Ok(())
            }
            LifecycleOperation::Stop => postgres
                .stop()
                .await
                .map_err(|err| postgres_failure(operation, &err)),
        }
    })
}

#[cfg(unix)]
async fn ensure_started(
    postgres: &mut PostgreSQL,
    operation: LifecycleOperation,
) -> Result<(), WorkerError> {
    if matches!(postgres.status(), Status::Started) {
        return Ok(());
    }
    postgres
        .start()
        .await
        .map_err(|err| postgres_failure(operation, &err))
}

#[cfg(unix)]
fn postgres_failure(operation: LifecycleOperation, err: &impl std::fmt::Display) -> WorkerError {
    WorkerError::Postgres {
        operation,
        message: err.to_string(),
    }
}

#[cfg(unix)]
fn maybe_reexec_unprivileged(args: &[String]) -> Result<(), WorkerError> {
    if !Uid::effective().is_root() || env::var_os(WORKER_REEXEC_ENV).is_some() {
        return Ok(());
    }

    let exe = env::current_exe()
        .map_err(WorkerError::RuntimeInit)?
        .into_os_string()
        .into_string()
        .map_err(|_| WorkerError::NonUtf8Argument)?;
    let status = match Command::new("runuser")
        .args(["-u", UNPRIVILEGED_USER, "--"])
        .arg(&exe)
        .args(args)
        .env(WORKER_REEXEC_ENV, "1")
        .env("PATH", TRUSTED_PATH)
        .status()
    {
        Ok(status) => status,
        Err(err) if err.kind() == io::ErrorKind::NotFound => run_via_su(&exe, args)?,
        Err(err) => return Err(WorkerError::PrivilegeDrop(err.to_string())),
    };

    std::process::exit(status.code().unwrap_or(1));
}

#[cfg(unix)]
fn run_via_su(exe: &str, args: &[String]) -> Result<ExitStatus, WorkerError> {
    let borrowed: Vec<&str> = args.iter().map(String::as_str).collect();
    Command::new("/bin/su")
        .args(["-s", "/bin/sh", UNPRIVILEGED_USER, "-c"])
        .arg(reexec_shell_command(exe, &borrowed))
        .env("PATH", TRUSTED_PATH)
        .status()
        .map_err(|err| WorkerError::PrivilegeDrop(err.to_string()))
}

#[cfg(unix)]
fn load_payload(config_path: &Utf8Path) -> Result<WorkerPayload, WorkerError> {
    let bytes = read_config_file(config_path).map_err(WorkerError::ConfigRead)?;
    serde_json::from_slice(&bytes).map_err(WorkerError::ConfigParse)
}

#[cfg(unix)]
fn read_config_file(path: &Utf8Path) -> Result<Vec<u8>, BoxError> {
    let (dir, relative) = ambient_dir_and_path(path)?;
    let mut file = dir.open(relative.as_std_path())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

#[cfg(unix)]
fn drop_privileges_if_root(username: &str) -> Result<(), WorkerError> {
    if !Uid::effective().is_root() {
        return Ok(());
    }

    let user = User::from_name(username)
        .map_err(|err| WorkerError::PrivilegeDrop(err.to_string()))?
        .ok_or_else(|| WorkerError::PrivilegeDrop(format!("user '{username}' not found")))?;
    let name = CString::new(user.name.clone())
        .map_err(|err| WorkerError::PrivilegeDrop(format!("invalid user name: {err}")))?;
    initgroups(&name, user.gid).map_err(|err| WorkerError::PrivilegeDrop(err.to_string()))?;
    setgid(user.gid).map_err(|err| WorkerError::PrivilegeDrop(err.to_string()))?;
    setuid(user.uid).map_err(|err| WorkerError::PrivilegeDrop(err.to_string()))?;

    // SAFETY: the worker is single-threaded at this point.
    unsafe {
        env::set_var("HOME", user.dir);
        env::set_var("USER", &user.name);
        env::set_var("LOGNAME", &user.name);
    }
    Ok(())
}

#[cfg(unix)]
fn apply_environment(environment: &[(String, Option<PlainSecret>)]) {
    for (key, value) in environment {
        // SAFETY: the worker is single-threaded and owns its environment.
        unsafe {
            match value {
                Some(plain) => env::set_var(key, plain.expose()),
                None => env::remove_var(key),
            }
        }
    }
}

#[cfg(not(unix))]
fn main() -> Result<(), BoxError> {
    Err("pg_worker is only supported on Unix platforms".into())
}
