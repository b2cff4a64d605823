/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Bitmask of HTTP verbs an access entry grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct VerbMask(pub i32);

impl VerbMask {
    pub const GET: VerbMask = VerbMask(1);
    pub const POST: VerbMask = VerbMask(2);
    pub const PUT: VerbMask = VerbMask(4);
    pub const PATCH: VerbMask = VerbMask(8);
    pub const DELETE: VerbMask = VerbMask(16);

    /// Every verb
    pub const FULL: VerbMask = VerbMask(1 | 2 | 4 | 8 | 16);

    pub const fn union(self, other: VerbMask) -> VerbMask {
        VerbMask(self.0 | other.0)
    }

    pub const fn contains(self, other: VerbMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for VerbMask {
    type Output = VerbMask;

    fn bitor(self, rhs: VerbMask) -> VerbMask {
        self.union(rhs)
    }
}

/// Bitmask of requestor types (direct API calls, server-side scripts)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct RequestorMask(pub i32);

impl RequestorMask {
    pub const API: RequestorMask = RequestorMask(1);
    pub const SCRIPT: RequestorMask = RequestorMask(2);

    /// Every generated entry is granted to all requestor types
    pub const ALL: RequestorMask = RequestorMask(1 | 2);
}

/// Admin record mutations the restricted-admin hook reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminAction {
    Create,
    Update,
}

impl AdminAction {
    /// POST creates, PUT/PATCH update; everything else is ignored
    pub fn from_method(method: &axum::http::Method) -> Option<Self> {
        match *method {
            axum::http::Method::POST => Some(AdminAction::Create),
            axum::http::Method::PUT | axum::http::Method::PATCH => Some(AdminAction::Update),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_mask_covers_every_verb() {
        for verb in [VerbMask::GET, VerbMask::POST, VerbMask::PUT, VerbMask::PATCH, VerbMask::DELETE] {
            assert!(VerbMask::FULL.contains(verb));
        }
        assert_eq!(VerbMask::FULL.0, 31);
        assert_eq!((VerbMask::GET | VerbMask::POST).0, 3);
    }

    #[test]
    fn admin_action_follows_method() {
        use axum::http::Method;
        assert_eq!(AdminAction::from_method(&Method::POST), Some(AdminAction::Create));
        assert_eq!(AdminAction::from_method(&Method::PATCH), Some(AdminAction::Update));
        assert_eq!(AdminAction::from_method(&Method::GET), None);
        assert_eq!(AdminAction::from_method(&Method::DELETE), None);
    }
}
