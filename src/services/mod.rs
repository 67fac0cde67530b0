//! Business logic services layer

pub mod auth_service;
pub mod events;
pub mod harbor_service;
pub mod operator_service;
pub mod permission_service;
pub mod role_service;
pub mod ship_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use events::{build_publisher, UserEventPublisher};
pub use harbor_service::HarborService;
pub use operator_service::OperatorService;
pub use permission_service::PermissionService;
pub use role_service::RoleService;
pub use ship_service::ShipService;
pub use user_service::UserService;
