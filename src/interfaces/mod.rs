//! Inbound HTTP surface. Both binaries accept HTTP — the
//! gateway for routing + administration, each worker for its own
//! `health`/`check-schedule`/`execute`/`signal` quartet (and, for the
//! `user` service, the profile/stocks/model/wanted-services routes).

pub mod http;
