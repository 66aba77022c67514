//! OpenMesh catalog core
//!
//! Local-first persistence for the OpenMesh 3D asset catalog: one service
//! that serves models and collections from either an embedded SQLite store
//! or the remote catalog service.

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod remote;
pub mod services;
pub mod storage;
