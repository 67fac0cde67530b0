//! 分页与统一响应信封

use crate::error::AppError;
use serde::Serialize;

/// 默认每页条数
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// 每页条数上限
pub const MAX_PAGE_SIZE: u32 = 100;

/// 已校验的分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub size: u32,
}

impl PageQuery {
    /// 从查询参数构建，page 从 1 开始，size 在 1..=100 之间
    pub fn new(page: Option<u32>, size: Option<u32>) -> Result<Self, AppError> {
        let page = page.unwrap_or(1);
        let size = size.unwrap_or(DEFAULT_PAGE_SIZE);

        if page < 1 {
            return Err(AppError::validation("page must be >= 1"));
        }
        if size < 1 || size > MAX_PAGE_SIZE {
            return Err(AppError::Validation(format!(
                "size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        Ok(Self { page, size })
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.size as i64
    }

    pub fn limit(&self) -> i64 {
        self.size as i64
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// 分页元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub current_page: u32,
    pub per_page: u32,
    pub total: i64,
    pub last_page: i64,
    pub from: i64,
    pub to: i64,
}

impl PageMetadata {
    /// 计算分页元数据
    ///
    /// `last_page` 最小为 1；当前页没有任何行时 `from = to = 0`。
    pub fn new(query: PageQuery, total: i64) -> Self {
        let size = query.size as i64;
        let total = total.max(0);

        let last_page = ((total + size - 1) / size).max(1);

        let offset = query.offset();
        let (from, to) = if total == 0 || offset >= total {
            (0, 0)
        } else {
            (offset + 1, (offset + size).min(total))
        };

        Self {
            current_page: query.page,
            per_page: query.size,
            total,
            last_page,
            from,
            to,
        }
    }
}

/// 统一响应信封
#[derive(Debug, Serialize)]
pub struct WebResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMetadata>,
}

impl<T: Serialize> WebResponse<T> {
    pub fn ok(message: &str, data: T) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data,
            meta: None,
        }
    }

    pub fn with_meta(message: &str, data: T, meta: PageMetadata) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data,
            meta: Some(meta),
        }
    }
}

/// 一页数据及其元数据
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMetadata,
}
