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
//! Component kinds and the tagged component enum
//!
//! Every capability an entity can have is one variant of [`Component`],
//! keyed by its [`ComponentKind`]. Systems declare the kinds they need as
//! data, and the store answers queries by kind.

use crate::ecs::components::{
    Collectible, Collision, Follow, Hazard, Health, Input, Movement, Position, Render,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a component kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// [`Position`]
    Position,
    /// [`Movement`]
    Movement,
    /// [`Collision`]
    Collision,
    /// [`Input`]
    Input,
    /// [`Health`]
    Health,
    /// [`Collectible`]
    Collectible,
    /// [`Hazard`]
    Hazard,
    /// [`Render`]
    Render,
    /// [`Follow`]
    Follow,
}

impl ComponentKind {
    /// Lowercase name for diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Position => "position",
            ComponentKind::Movement => "movement",
            ComponentKind::Collision => "collision",
            ComponentKind::Input => "input",
            ComponentKind::Health => "health",
            ComponentKind::Collectible => "collectible",
            ComponentKind::Hazard => "hazard",
            ComponentKind::Render => "render",
            ComponentKind::Follow => "follow",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single tagged bundle of component data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Component {
    /// Placement and facing
    Position(Position),
    /// Velocity and movement tuning
    Movement(Movement),
    /// Circular collider
    Collision(Collision),
    /// Key bindings and current intent
    Input(Input),
    /// Hit points
    Health(Health),
    /// Pickup payload
    Collectible(Collectible),
    /// Contact damage
    Hazard(Hazard),
    /// Renderer hints
    Render(Render),
    /// Chase target
    Follow(Follow),
}

/// Typed access to one variant of [`Component`]
///
/// Implemented for every component data type so the store can offer
/// `get::<Position>(id)` alongside the kind-keyed accessors.
pub trait ComponentData: Into<Component> + Sized + 'static {
    /// The kind this type is stored under
    const KIND: ComponentKind;

    /// Borrow the data if `component` is this variant
    fn from_component(component: &Component) -> Option<&Self>;

    /// Mutably borrow the data if `component` is this variant
    fn from_component_mut(component: &mut Component) -> Option<&mut Self>;
}

macro_rules! component_variants {
    ($($variant:ident),* $(,)?) => {
        impl Component {
            /// The kind of this component
            pub fn kind(&self) -> ComponentKind {
                match self {
                    $(Component::$variant(_) => ComponentKind::$variant,)*
                }
            }
        }

        $(
            impl From<$variant> for Component {
                fn from(data: $variant) -> Self {
                    Component::$variant(data)
                }
            }

            impl ComponentData for $variant {
                const KIND: ComponentKind = ComponentKind::$variant;

                fn from_component(component: &Component) -> Option<&Self> {
                    match component {
                        Component::$variant(data) => Some(data),
                        _ => None,
                    }
                }

                fn from_component_mut(component: &mut Component) -> Option<&mut Self> {
                    match component {
                        Component::$variant(data) => Some(data),
                        _ => None,
                    }
                }
            }
        )*
    };
}

component_variants!(
    Position,
    Movement,
    Collision,
    Input,
    Health,
    Collectible,
    Hazard,
    Render,
    Follow,
);
