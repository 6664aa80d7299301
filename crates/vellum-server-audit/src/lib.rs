// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod event;

pub use event::{Actor, AuditEventType, AuditLogBuilder, AuditLogEntry, AuditSeverity};
