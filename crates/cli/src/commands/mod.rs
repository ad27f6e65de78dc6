// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod produce;
pub mod run;
pub mod table;
pub mod topic;
