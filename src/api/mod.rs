pub(crate) mod auth;
pub(crate) mod client;
pub(crate) mod error;
pub(crate) mod notifications;
pub(crate) mod poll;
pub(crate) mod reservations;
pub(crate) mod rooms;
pub(crate) mod users;
