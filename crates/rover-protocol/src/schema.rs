//! 宽容字段提取工具
//!
//! 协议对可选字段采用"类型正确则取值，否则用默认值"的策略，对必填
//! 字段采用"缺失或类型错误即拒绝"的策略。本模块把这套提取逻辑收敛为
//! 一组共享访问器，供所有按 kind 的命令解析器和配置加载器复用。
//!
//! 数值统一经由 f64 读出再窄化到目标整数类型：小数截断，超出目标
//! 类型范围时饱和到边界。

use serde_json::{Map, Value};

/// 已解码的 JSON 对象
pub(crate) type Object = Map<String, Value>;

/// 必填数值字段；缺失或类型不符时返回 None
pub(crate) fn f64_required(obj: &Object, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}

/// 必填字符串字段；缺失或类型不符时返回 None
pub(crate) fn str_required<'a>(obj: &'a Object, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

/// i32 字段，缺失或类型不符时返回默认值
pub(crate) fn i32_or(obj: &Object, key: &str, default: i32) -> i32 {
    f64_required(obj, key).map_or(default, |v| v as i32)
}

/// u32 字段，缺失或类型不符时返回默认值
pub(crate) fn u32_or(obj: &Object, key: &str, default: u32) -> u32 {
    f64_required(obj, key).map_or(default, |v| v as u32)
}

/// u16 字段，缺失或类型不符时返回默认值
pub(crate) fn u16_or(obj: &Object, key: &str, default: u16) -> u16 {
    f64_required(obj, key).map_or(default, |v| v as u16)
}

/// u8 字段，缺失或类型不符时返回默认值
pub(crate) fn u8_or(obj: &Object, key: &str, default: u8) -> u8 {
    f64_required(obj, key).map_or(default, |v| v as u8)
}

/// 布尔字段，缺失或类型不符时返回默认值
pub(crate) fn bool_or(obj: &Object, key: &str, default: bool) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// f32 字段，类型正确时覆盖目标槽位（配置快照用）
pub(crate) fn f32_into(obj: &Object, key: &str, slot: &mut f32) {
    if let Some(v) = f64_required(obj, key) {
        *slot = v as f32;
    }
}
