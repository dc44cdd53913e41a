//! 汎用ツールチップコンポーネント
//!
//! トリガーのホバー中だけ、指定した辺に沿って吹き出しを表示する

use leptos::*;

use crate::utils::listeners::DomListener;

/// トリガーと吹き出しの間隔（px）
const TOOLTIP_GAP: f64 = 8.0;

/// 吹き出しを出す辺
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TooltipPosition {
    #[default]
    Top,
    Bottom,
    Left,
    Right,
}

/// トリガー矩形（top, left, width, height）から吹き出しの基準点を求める
fn label_anchor(position: TooltipPosition, top: f64, left: f64, width: f64, height: f64) -> (f64, f64) {
    match position {
        TooltipPosition::Top => (top - TOOLTIP_GAP, left + width / 2.0),
        TooltipPosition::Bottom => (top + height + TOOLTIP_GAP, left + width / 2.0),
        TooltipPosition::Left => (top + height / 2.0, left - TOOLTIP_GAP),
        TooltipPosition::Right => (top + height / 2.0, left + width + TOOLTIP_GAP),
    }
}

/// 基準点から見た吹き出し自身のずらし方
fn label_transform(position: TooltipPosition) -> &'static str {
    match position {
        TooltipPosition::Top | TooltipPosition::Bottom => "translate(-50%, -100%)",
        TooltipPosition::Left => "translate(-100%, -50%)",
        TooltipPosition::Right => "translate(0, -50%)",
    }
}

/// 汎用ツールチップ
///
/// 吹き出しはPortalでbody直下に描画するため、祖先のoverflowに切られない。
/// 位置の再計算は表示中のscroll/resizeのみで行う
#[component]
pub fn Tooltip(
    /// 表示テキスト
    text: String,
    #[prop(optional)] position: TooltipPosition,
    children: Children,
) -> impl IntoView {
    let (visible, set_visible) = create_signal(false);
    let (coords, set_coords) = create_signal((0.0_f64, 0.0_f64));
    let trigger_ref = create_node_ref::<html::Span>();

    let update_position = move || {
        let Some(el) = trigger_ref.get_untracked() else {
            return;
        };
        let rect = el.get_bounding_client_rect();
        set_coords.set(label_anchor(
            position,
            rect.top(),
            rect.left(),
            rect.width(),
            rect.height(),
        ));
    };

    // 表示中だけscroll（キャプチャ）とresizeを購読して追従させる
    let listeners = store_value(Vec::<DomListener>::new());
    create_effect(move |_| {
        if visible.get() {
            update_position();
            let mut subs = Vec::new();
            if let Some(l) = DomListener::window("scroll", true, move |_| update_position()) {
                subs.push(l);
            }
            if let Some(l) = DomListener::window("resize", false, move |_| update_position()) {
                subs.push(l);
            }
            listeners.set_value(subs);
        } else {
            listeners.set_value(Vec::new());
        }
    });
    on_cleanup(move || listeners.set_value(Vec::new()));

    view! {
        <span
            class="tooltip-trigger"
            node_ref=trigger_ref
            on:mouseenter=move |_| set_visible.set(true)
            on:mouseleave=move |_| set_visible.set(false)
        >
            {children()}
            {move || {
                let text = text.clone();
                visible.get().then(|| view! {
                    <Portal>
                        <div
                            class="tooltip-overlay"
                            style=move || {
                                let (top, left) = coords.get();
                                format!(
                                    "top: {}px; left: {}px; transform: {};",
                                    top, left, label_transform(position)
                                )
                            }
                        >
                            <div class="tooltip-label">{text.clone()}</div>
                        </div>
                    </Portal>
                })
            }}
        </span>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 矩形: top=100, left=200, width=40, height=20

    #[test]
    fn test_anchor_top_and_bottom_center_horizontally() {
        assert_eq!(
            label_anchor(TooltipPosition::Top, 100.0, 200.0, 40.0, 20.0),
            (92.0, 220.0)
        );
        assert_eq!(
            label_anchor(TooltipPosition::Bottom, 100.0, 200.0, 40.0, 20.0),
            (128.0, 220.0)
        );
    }

    #[test]
    fn test_anchor_left_and_right_center_vertically() {
        assert_eq!(
            label_anchor(TooltipPosition::Left, 100.0, 200.0, 40.0, 20.0),
            (110.0, 192.0)
        );
        assert_eq!(
            label_anchor(TooltipPosition::Right, 100.0, 200.0, 40.0, 20.0),
            (110.0, 248.0)
        );
    }

    #[test]
    fn test_transform_matches_side() {
        assert_eq!(label_transform(TooltipPosition::Top), "translate(-50%, -100%)");
        assert_eq!(label_transform(TooltipPosition::Bottom), "translate(-50%, -100%)");
        assert_eq!(label_transform(TooltipPosition::Left), "translate(-100%, -50%)");
        assert_eq!(label_transform(TooltipPosition::Right), "translate(0, -50%)");
    }
}
