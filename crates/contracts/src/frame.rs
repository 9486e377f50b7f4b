//! FrameImage / FrameRecord - 帧相机数据
//!
//! 帧相机输出的原始图像结构。

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// 像素格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Mono8,
    Rgb8,
    Bgr8,
}

impl PixelFormat {
    /// 每像素字节数
    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Mono8 => 1,
            PixelFormat::Rgb8 | PixelFormat::Bgr8 => 3,
        }
    }
}

/// 帧相机图像
///
/// 从帧相机采集回调接收的原始数据 (零拷贝载荷)。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameImage {
    /// 图像宽度
    pub width: u32,

    /// 图像高度
    pub height: u32,

    /// 像素格式
    pub format: PixelFormat,

    /// 原始像素数据 (零拷贝)
    pub data: Bytes,
}

impl FrameImage {
    /// Expected payload length for the declared geometry
    #[inline]
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// 入队后的帧：图像 + 队列分配的序号
///
/// `sequence_index` 由帧队列在入队时分配，严格递增。
#[derive(Debug, Clone)]
pub struct FrameRecord {
    /// 原始图像
    pub image: FrameImage,

    /// 帧序号 (严格递增)
    pub sequence_index: u64,
}
