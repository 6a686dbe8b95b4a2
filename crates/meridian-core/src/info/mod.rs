//! Info - ノード間の info request プロトコル
//!
//! 他のノードは `POST /info/{capability}[/...]` で web ノードに問い合わせます。
//!
//! # 主要コンポーネント
//! - **InfoRequest**: capability（名前付きの handler）の trait
//! - **CapabilityRegistry**: 名前 → handler（起動時に 1 回だけ組み立てる）
//! - **InfoRequestRouter**: 検証・振り分け・失敗の分類・接続記録

mod capability;
mod registry;
mod request;
mod response;
mod router;

pub use self::capability::InfoRequest;
pub use self::registry::{CapabilityRegistry, RegistryError, normalize};
pub use self::request::{InboundRequest, MOUNT_SEGMENT, WRITE_METHOD};
pub use self::response::InfoResponse;
pub use self::router::InfoRequestRouter;

/// Tracing target for routing activity.
pub(crate) const INFO_TARGET: &str = "meridian_core::info";
