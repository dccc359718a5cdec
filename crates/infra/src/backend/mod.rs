//! Backend-as-a-service adapter.
//!
//! `adapter` speaks the REST protocol; `codec` owns the translation between
//! the normalised documents used by the services and the backend's wire
//! shape (`objectId`, tagged dates).

pub mod adapter;
pub mod codec;

pub use adapter::{
    BackendRestAdapter, APP_ID_HEADER, MASTER_KEY_HEADER, REST_KEY_HEADER, SESSION_TOKEN_HEADER,
};
