//! ナレッジベースカードコンポーネント
//!
//! フォルダのタイル表示。centralなカードだけ操作メニューを持つ

use leptos::*;
use wasm_bindgen::JsCast;

use crate::components::tooltip::{Tooltip, TooltipPosition};
use crate::models::Visibility;
use crate::utils::hash_id;
use crate::utils::listeners::DomListener;
use crate::utils::log_trace::log_info;

/// 右下に出す共有インジケータ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareBadge {
    /// 自分が共有している（👤）
    YouShare,
    /// 他人から共有されている（👥）
    OthersShare,
    /// システム配布フォルダ（📢）
    System,
}

/// IDの安定ハッシュからバッジを決める
///
/// 余り0で「自分が共有」、1で「共有されている」、2・3はバッジなし。
/// `system` タグ付きはハッシュに関係なく常にメガホン
pub fn share_badge(id: &str, role_tags: &[String]) -> Option<ShareBadge> {
    if role_tags.iter().any(|t| t.eq_ignore_ascii_case("system")) {
        return Some(ShareBadge::System);
    }
    match hash_id(id) % 4 {
        0 => Some(ShareBadge::YouShare),
        1 => Some(ShareBadge::OthersShare),
        _ => None,
    }
}

/// 右下の共有インジケータと紛らわしいので、👥はフォルダ絵文字に差し替える
pub fn display_emoji(emoji: &str) -> &str {
    if emoji == "👥" {
        "📁"
    } else {
        emoji
    }
}

/// ナレッジベースカード
///
/// central変種はPermissions/Edit/Deleteのメニューを持ち、
/// メニュー外のmousedownで閉じる。それ以外は無効風のボタンのみ
#[component]
pub fn KnowledgeBaseCard(
    id: String,
    title: String,
    emoji: String,
    visibility: Visibility,
    #[prop(optional)] is_central: bool,
    #[prop(optional)] role_tags: Vec<String>,
    #[prop(optional, into)] on_click: Option<Callback<()>>,
    #[prop(optional, into)] on_edit: Option<Callback<String>>,
    #[prop(optional, into)] on_delete: Option<Callback<String>>,
    #[prop(optional, into)] on_permissions: Option<Callback<String>>,
) -> impl IntoView {
    let card_class = match visibility {
        Visibility::Public => "kb-card",
        Visibility::Private => "kb-card kb-card-private",
    };
    let badge = share_badge(&id, &role_tags);
    let shown_emoji = display_emoji(&emoji).to_string();
    let card_id = store_value(id);

    let (menu_open, set_menu_open) = create_signal(false);
    let menu_ref = create_node_ref::<html::Div>();

    // メニュー表示中だけdocumentのmousedownを購読して外側クリックで閉じる
    let outside_click = store_value(None::<DomListener>);
    create_effect(move |_| {
        if menu_open.get() {
            let listener = DomListener::document("mousedown", move |ev| {
                let Some(anchor) = menu_ref.get_untracked() else {
                    return;
                };
                let target = ev.target().and_then(|t| t.dyn_into::<web_sys::Node>().ok());
                if !anchor.contains(target.as_ref()) {
                    set_menu_open.set(false);
                }
            });
            outside_click.set_value(listener);
        } else {
            outside_click.set_value(None);
        }
    });
    on_cleanup(move || outside_click.set_value(None));

    let handle_more = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        set_menu_open.update(|open| *open = !*open);
    };
    let handle_permissions = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        set_menu_open.set(false);
        log_info("ui-action", "card menu: permissions");
        if let Some(cb) = on_permissions {
            cb.call(card_id.get_value());
        }
    };
    let handle_edit = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        set_menu_open.set(false);
        log_info("ui-action", "card menu: edit");
        if let Some(cb) = on_edit {
            cb.call(card_id.get_value());
        }
    };
    let handle_delete = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        set_menu_open.set(false);
        log_info("ui-action", "card menu: delete");
        if let Some(cb) = on_delete {
            cb.call(card_id.get_value());
        }
    };
    let handle_card_click = move |_| {
        if let Some(cb) = on_click {
            cb.call(());
        }
    };

    view! {
        <div class=card_class on:click=handle_card_click>
            <div class="kb-card-header">
                <div class="kb-card-emoji">{shown_emoji}</div>
                {if is_central {
                    view! {
                        <div class="card-menu-anchor" node_ref=menu_ref>
                            <button class="more-btn" on:click=handle_more>"⋯"</button>
                            {move || menu_open.get().then(|| view! {
                                <div class="card-menu">
                                    <button class="menu-item" on:click=handle_permissions>
                                        <span class="menu-icon">"👥"</span>
                                        <span class="menu-label">"Permissions"</span>
                                    </button>
                                    <button class="menu-item" on:click=handle_edit>
                                        <span class="menu-icon">"✏️"</span>
                                        <span class="menu-label">"Edit"</span>
                                    </button>
                                    <button class="menu-item menu-item-danger" on:click=handle_delete>
                                        <span class="menu-icon">"🗑"</span>
                                        <span class="menu-label">"Delete"</span>
                                    </button>
                                </div>
                            })}
                        </div>
                    }.into_view()
                } else {
                    view! {
                        <button class="more-btn disabled" disabled=true>"⋯"</button>
                    }.into_view()
                }}
            </div>

            <h3 class="kb-card-title">{title}</h3>

            // 右下のインジケータ: システム📢 または共有バッジ👤/👥
            <div class="kb-card-indicators">
                {match badge {
                    Some(ShareBadge::System) => view! {
                        <Tooltip text="Marketplace share this folder with you".to_string() position=TooltipPosition::Top>
                            <span class="share-indicator">"📢"</span>
                        </Tooltip>
                    }.into_view(),
                    Some(ShareBadge::YouShare) => view! {
                        <Tooltip text="You share this folder to others.".to_string() position=TooltipPosition::Top>
                            <span class="share-indicator">"👤"</span>
                        </Tooltip>
                    }.into_view(),
                    Some(ShareBadge::OthersShare) => view! {
                        <Tooltip text="Others share this folder with you.".to_string() position=TooltipPosition::Top>
                            <span class="share-indicator">"👥"</span>
                        </Tooltip>
                    }.into_view(),
                    None => ().into_view(),
                }}
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_badge_is_deterministic() {
        for id in ["kb-product", "kb-design", "kb-people", ""] {
            assert_eq!(share_badge(id, &[]), share_badge(id, &[]));
        }
    }

    #[test]
    fn test_badge_follows_hash_remainder() {
        // "d"=100→余り0、"a"=97→余り1、"b"=98と"c"=99→なし
        assert_eq!(share_badge("d", &[]), Some(ShareBadge::YouShare));
        assert_eq!(share_badge("a", &[]), Some(ShareBadge::OthersShare));
        assert_eq!(share_badge("b", &[]), None);
        assert_eq!(share_badge("c", &[]), None);
    }

    #[test]
    fn test_system_tag_always_shows_megaphone() {
        let tags = vec!["System".to_string()];
        for id in ["a", "b", "c", "d", "kb-announcements"] {
            assert_eq!(share_badge(id, &tags), Some(ShareBadge::System));
        }
    }

    #[test]
    fn test_group_emoji_is_substituted() {
        assert_eq!(display_emoji("👥"), "📁");
        assert_eq!(display_emoji("📘"), "📘");
    }
}
