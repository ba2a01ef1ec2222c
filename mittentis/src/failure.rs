//! Process-wide reporting of failures nobody is waiting on.
//!
//! A fire-and-forget task has no joiner to deliver a panic to, so its
//! failure is routed here instead of vanishing. The default hook logs
//! the message at error level; applications may install their own to
//! forward failures to a crash reporter or fail the process.

use std::sync::{LazyLock, RwLock};

type Hook = Box<dyn Fn(&str) + Send + Sync>;

static HOOK: LazyLock<RwLock<Hook>> =
    LazyLock::new(|| RwLock::new(Box::new(|message| log::error!("task failed: {message}"))));

/// Installs the process-wide failure hook.
///
/// The hook receives the panic message of every fire-and-forget task
/// that fails. Replaces the previous hook; the default logs at error
/// level.
pub fn set_failure_hook<F>(hook: F)
where
    F: Fn(&str) + Send + Sync + 'static,
{
    *HOOK.write().unwrap() = Box::new(hook);
}

/// Delivers a failure message to the installed hook.
pub(crate) fn report(message: &str) {
    (HOOK.read().unwrap())(message);
}
