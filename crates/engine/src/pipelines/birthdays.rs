// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Customer birth years printed to the console

use crate::stage::TransformStage;
use trib_core::schema::{Customer, RedisMessage};
use trib_core::transform::CustomerBirthYear;
use trib_core::{NestedCodec, TopicNames};

pub type BirthdaysStage =
    TransformStage<Customer, NestedCodec<RedisMessage, Customer>, CustomerBirthYear>;

pub fn stage(topics: &TopicNames) -> BirthdaysStage {
    TransformStage::new(
        super::PipelineKind::CustomerBirthdays.name(),
        &topics.redis_server,
        NestedCodec::new(),
        CustomerBirthYear,
    )
}
