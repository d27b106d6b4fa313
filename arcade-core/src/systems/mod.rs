// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Built-in per-frame systems
//!
//! Input runs first and writes each entity's intent, movement integrates
//! velocity into position, and collision resolves overlaps on the moved
//! positions. Their priorities live in [`crate::ecs::scheduler::priorities`].

pub mod input;
pub mod movement;

pub use input::{
    bound_keys, InputDevice, InputError, InputSystem, KeyEvent, KeySink, ListenerId,
    INPUT_SYSTEM_NAME,
};
pub use movement::{MovementStats, MovementSystem, MOVEMENT_SYSTEM_NAME};
pub use crate::collision::{CollisionSystem, COLLISION_SYSTEM_NAME};
