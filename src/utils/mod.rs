//! ユーティリティモジュール

pub mod listeners;
pub mod log_trace;

// 共通ヘルパー

/// 現在時刻（エポックミリ秒）
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// 識別子の安定ハッシュ
///
/// `h = h*31 + コード単位` を32bit符号付きで畳み込み、絶対値を返す。
/// 同じIDは再描画をまたいでも常に同じ値になる（バッジ選択のチラつき防止）
pub fn hash_id(id: &str) -> u32 {
    let mut h: i32 = 0;
    for unit in id.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(unit as i32);
    }
    h.unsigned_abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_id_is_deterministic() {
        for id in ["kb-product", "kb-announcements", "", "日本語ID"] {
            assert_eq!(hash_id(id), hash_id(id));
        }
    }

    #[test]
    fn test_hash_id_known_values() {
        // "a" = 97, "ab" = 97*31 + 98
        assert_eq!(hash_id(""), 0);
        assert_eq!(hash_id("a"), 97);
        assert_eq!(hash_id("ab"), 97 * 31 + 98);
    }

    #[test]
    fn test_hash_id_folds_in_32_bits_without_overflow() {
        // 長い文字列でもパニックせず、絶対値に収まる
        let long = "x".repeat(4096);
        let h = hash_id(&long);
        assert!(h <= i32::MIN.unsigned_abs());
    }
}
