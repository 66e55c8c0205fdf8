//! Transient notifications. Only the newest toast is shown; it expires after
//! a kind-specific delay measured against a caller-supplied clock.

use std::fmt::Display;

use log::debug;

pub const INFO_TOAST_MS: u64 = 1200;
pub const ERROR_TOAST_MS: u64 = 2500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Error,
}

impl ToastKind {
    pub fn duration_ms(&self) -> u64 {
        match self {
            ToastKind::Info => INFO_TOAST_MS,
            ToastKind::Error => ERROR_TOAST_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub expires_at_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToastQueue {
    current: Option<Toast>,
    next_id: u64,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>, now_ms: u64) -> &Toast {
        let message = message.into();
        debug!("Toast {:?}: {}", kind, message);
        self.next_id += 1;
        self.current.insert(Toast {
            id: self.next_id,
            kind,
            message,
            expires_at_ms: now_ms + kind.duration_ms(),
        })
    }

    pub fn info(&mut self, message: impl Into<String>, now_ms: u64) -> &Toast {
        self.push(ToastKind::Info, message, now_ms)
    }

    pub fn error(&mut self, message: impl Into<String>, now_ms: u64) -> &Toast {
        self.push(ToastKind::Error, message, now_ms)
    }

    /// Error toast from any failure; the form behind it stays untouched
    pub fn failure(&mut self, err: &impl Display, now_ms: u64) -> &Toast {
        self.error(err.to_string(), now_ms)
    }

    /// The toast to render at `now_ms`, if it has not expired
    pub fn visible(&self, now_ms: u64) -> Option<&Toast> {
        self.current.as_ref().filter(|t| now_ms < t.expires_at_ms)
    }

    /// Drop the toast once expired; returns `true` when something was removed
    pub fn expire(&mut self, now_ms: u64) -> bool {
        if self.current.as_ref().is_some_and(|t| now_ms >= t.expires_at_ms) {
            self.current = None;
            return true;
        }
        false
    }

    /// Dismiss only if `id` is still the current toast
    pub fn dismiss(&mut self, id: u64) {
        if self.current.as_ref().is_some_and(|t| t.id == id) {
            self.current = None;
        }
    }
}
