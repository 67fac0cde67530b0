//! 数据模型模块
//! 身份、授权图（角色/权限/港口范围）以及船队资源

pub mod auth;
pub mod harbor;
pub mod operator;
pub mod pagination;
pub mod role;
pub mod ship;
pub mod user;

/// 部分更新：请求中出现的字段覆盖目标，缺省字段保持不变
macro_rules! patch {
    ($req:expr => $target:expr; $($field:ident),* $(,)?) => {
        $(
            if let Some(value) = &$req.$field {
                $target.$field = value.clone();
            }
        )*
    };
}

/// 同 `patch!`，目标字段本身是 Option
macro_rules! patch_some {
    ($req:expr => $target:expr; $($field:ident),* $(,)?) => {
        $(
            if let Some(value) = &$req.$field {
                $target.$field = Some(value.clone());
            }
        )*
    };
}

pub(crate) use patch;
pub(crate) use patch_some;
