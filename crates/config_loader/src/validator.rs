//! 配置校验模块
//!
//! 校验规则：
//! - 队列容量 / 退避 / 轮询超时 >= 1 (derive 校验)
//! - mock 帧率、事件率、分辨率 > 0 (derive 校验)
//! - mock 曝光时长必须短于帧周期
//! - device 模式下两个序列号必填
//! - 启用录制时 output_dir 非空

use contracts::{PipelineBlueprint, PipelineError, RecorderKind, SourceKind};
use validator::Validate;

/// 校验 PipelineBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &PipelineBlueprint) -> Result<(), PipelineError> {
    validate_tuning(blueprint)?;
    validate_source(blueprint)?;
    validate_recording(blueprint)?;
    Ok(())
}

/// 校验同步调参 (字段范围)
fn validate_tuning(blueprint: &PipelineBlueprint) -> Result<(), PipelineError> {
    blueprint
        .combo
        .validate()
        .map_err(|e| PipelineError::config_validation("combo", e.to_string()))?;
    blueprint
        .combo
        .pool
        .validate()
        .map_err(|e| PipelineError::config_validation("combo.pool", e.to_string()))?;
    Ok(())
}

/// 校验数据源配置
fn validate_source(blueprint: &PipelineBlueprint) -> Result<(), PipelineError> {
    let source = &blueprint.source;

    match source.kind {
        SourceKind::Mock => {
            let mock = &source.mock;
            mock.validate()
                .map_err(|e| PipelineError::config_validation("source.mock", e.to_string()))?;

            // 曝光窗口必须落在帧周期内，否则相邻窗口重叠
            if mock.exposure_us() >= mock.frame_period_us() {
                return Err(PipelineError::config_validation(
                    "source.mock.exposure_ms",
                    format!(
                        "exposure ({} us) must be shorter than the frame period ({} us)",
                        mock.exposure_us(),
                        mock.frame_period_us()
                    ),
                ));
            }
        }
        SourceKind::Device => {
            if source.rgb_serial.is_empty() {
                return Err(PipelineError::config_validation(
                    "source.rgb_serial",
                    "rgb_serial is required for device sources",
                ));
            }
            if source.dvs_serial.is_empty() {
                return Err(PipelineError::config_validation(
                    "source.dvs_serial",
                    "dvs_serial is required for device sources",
                ));
            }
        }
    }

    Ok(())
}

/// 校验录制配置
fn validate_recording(blueprint: &PipelineBlueprint) -> Result<(), PipelineError> {
    let recording = &blueprint.recording;
    if recording.enabled
        && recording.recorder == RecorderKind::Session
        && recording.output_dir.is_empty()
    {
        return Err(PipelineError::config_validation(
            "recording.output_dir",
            "output_dir cannot be empty when session recording is enabled",
        ));
    }
    Ok(())
}
