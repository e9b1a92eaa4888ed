//! Order creation payloads and their category-specific validation

use serde::{Deserialize, Serialize};

use super::task::TaskType;
use crate::error::{AppError, AppResult};
use crate::models::NewOrder;
use crate::util::non_blank;

/// Maximum number of image URLs attached to one order
pub const MAX_IMAGES: usize = 10;

/// `POST /orders` body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub task_type: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub request_count: Option<i64>,
    #[serde(default)]
    pub video_url: Option<String>,
}

impl CreateOrderRequest {
    pub fn validate(self) -> AppResult<NewOrder> {
        let task_type: TaskType = self.task_type.parse()?;
        if task_type.is_review() {
            return Err(AppError::validation(
                "블로그/영수증 리뷰는 리뷰 신청 화면에서 요청해주세요",
            )
            .with_detail("taskType", task_type.as_str()));
        }

        let mut new = NewOrder::pending(task_type);
        new.image_urls = clean_images(self.image_urls)?;
        new.caption = owned(self.caption.as_deref());
        new.video_url = owned(self.video_url.as_deref());

        match task_type {
            TaskType::Follower | TaskType::Like => {
                let count = self.request_count.unwrap_or(0);
                if count < 1 {
                    return Err(missing("requestCount", "요청 수량은 1 이상이어야 합니다"));
                }
                new.request_count = Some(count);
            }
            TaskType::Hotpost
            | TaskType::Momcafe
            | TaskType::Powerblog
            | TaskType::Daangn
            | TaskType::Experience => {
                if new.caption.is_none() {
                    return Err(missing("caption", "내용을 입력해주세요"));
                }
            }
            TaskType::Clip => {
                if new.video_url.is_none() {
                    return Err(missing("videoUrl", "영상을 첨부해주세요"));
                }
            }
            TaskType::Myexpense => {
                if new.image_urls.is_empty() {
                    return Err(missing("imageUrls", "이미지를 1장 이상 첨부해주세요"));
                }
            }
            TaskType::BlogReview | TaskType::ReceiptReview => {}
        }

        Ok(new)
    }
}

/// `POST /orders/review-request` body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOrderRequest {
    pub task_type: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub guide_text: Option<String>,
    #[serde(default)]
    pub guide_file_url: Option<String>,
}

impl ReviewOrderRequest {
    pub fn validate(self) -> AppResult<NewOrder> {
        let task_type: TaskType = self.task_type.parse()?;
        if !task_type.is_review() {
            return Err(AppError::validation("리뷰 작업 유형이 아닙니다")
                .with_detail("taskType", task_type.as_str()));
        }

        let mut new = NewOrder::pending(task_type);
        new.image_urls = clean_images(self.image_urls)?;
        new.caption = owned(self.caption.as_deref());
        new.video_url = owned(self.video_url.as_deref());
        new.guide_text = owned(self.guide_text.as_deref());
        new.guide_file_url = owned(self.guide_file_url.as_deref());

        if new.guide_text.is_none() && new.guide_file_url.is_none() {
            return Err(missing("guideText", "가이드 내용 또는 가이드 파일을 첨부해주세요"));
        }
        if task_type == TaskType::ReceiptReview && new.image_urls.is_empty() {
            return Err(missing("imageUrls", "영수증 이미지를 첨부해주세요"));
        }

        Ok(new)
    }
}

fn clean_images(urls: Vec<String>) -> AppResult<Vec<String>> {
    let urls: Vec<String> = urls
        .iter()
        .filter_map(|u| non_blank(Some(u.as_str())))
        .map(str::to_string)
        .collect();
    if urls.len() > MAX_IMAGES {
        return Err(
            AppError::validation(format!("이미지는 최대 {MAX_IMAGES}장까지 첨부할 수 있습니다"))
                .with_detail("field", "imageUrls")
                .with_detail("max", MAX_IMAGES),
        );
    }
    Ok(urls)
}

fn owned(value: Option<&str>) -> Option<String> {
    non_blank(value).map(str::to_string)
}

fn missing(field: &'static str, message: &str) -> AppError {
    AppError::validation(message).with_detail("field", field)
}
