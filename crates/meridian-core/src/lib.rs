//! meridian-core
//!
//! Core building blocks for a Meridian node: a criticality-aware task
//! dispatcher and the peer-facing info request router.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, criticality, errors, status, connection）
//! - **ports**: 抽象化レイヤー（ConnectionAuditLog, Clock, IdGenerator）
//! - **processing**: TaskDispatcher（critical / non-critical の 2 系統プール）
//! - **info**: InfoRequest trait, CapabilityRegistry, InfoRequestRouter
//! - **impls**: 実装（InMemoryConnectionLog, JsonLinesConnectionLog）
//! - **app**: 組み立てと設定（NodeBuilder, NodeConfig）

pub mod app;
pub mod domain;
pub mod impls;
pub mod info;
pub mod ports;
pub mod processing;
