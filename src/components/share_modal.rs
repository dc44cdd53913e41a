//! 共有権限モーダルコンポーネント
//!
//! 共有モード（ユーザー/グループの権限一覧）と招待モード（タグ入力＋候補検索）
//! を切り替える。コレクションはモックのPermissionRepositoryが持つ

use leptos::*;
use std::collections::HashSet;
use wasm_bindgen::JsCast;

use gloo::timers::future::TimeoutFuture;

use crate::models::{
    available_suggestions, confirm_invite_text, filter_suggestions, toggle_group, InviteError,
    InviteKind, InviteTag, MockDirectory, Permission, PermissionChoice, PermissionRepository,
    RoleGroup, Suggestion, User,
};
use crate::utils::listeners::DomListener;
use crate::utils::log_trace::{log_info, log_info_with_data, log_warn};
use crate::utils::now_ms;

/// モーダルの表示モード。遷移のたびに招待系の一時状態を全部リセットする
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ModalMode {
    #[default]
    Share,
    Invite,
}

fn set_body_overflow(value: &str) {
    if let Some(body) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body())
    {
        let _ = body.style().set_property("overflow", value);
    }
}

/// 共有権限モーダル
///
/// 開閉状態は持たない。モーダル外のmousedownと✕ボタンは `on_close` を呼ぶだけ
#[component]
pub fn SharePermissionModal(
    #[prop(into)] is_open: MaybeSignal<bool>,
    #[prop(into)] knowledge_base_name: MaybeSignal<String>,
    #[prop(into)] on_close: Callback<()>,
    #[prop(optional, into)] on_invite_success: Option<Callback<()>>,
) -> impl IntoView {
    let kb_name = Signal::derive(move || knowledge_base_name.get());

    // モックデータ。実運用ではディレクトリAPIバックエンドに差し替える
    let directory = create_rw_signal(MockDirectory::seeded());
    let suggested = store_value(MockDirectory::suggested(now_ms()));

    let (mode, set_mode) = create_signal(ModalMode::Share);
    let (expanded_groups, set_expanded_groups) = create_signal(HashSet::<String>::new());
    let (invite_tags, set_invite_tags) = create_signal(Vec::<InviteTag>::new());
    let (input_value, set_input_value) = create_signal(String::new());
    let (validation_error, set_validation_error) = create_signal(None::<InviteError>);
    let (invite_permission, set_invite_permission) = create_signal(Permission::ViewOnly);
    let modal_ref = create_node_ref::<html::Div>();
    let input_ref = create_node_ref::<html::Input>();

    let sorted_users = create_memo(move |_| directory.with(|d| d.list_users()));
    let sorted_groups = create_memo(move |_| directory.with(|d| d.list_groups()));
    // 候補プール（すでに権限を持つIDを除外）と、入力テキストによる絞り込み
    let suggestion_pool = create_memo(move |_| {
        let (sugg_users, sugg_groups) = suggested.get_value();
        directory.with(|d| available_suggestions(&sugg_users, &sugg_groups, &d.users, &d.groups))
    });
    let search_results =
        create_memo(move |_| filter_suggestions(&input_value.get(), &suggestion_pool.get()));

    let focus_input_to_end = move || {
        let Some(input) = input_ref.get_untracked() else {
            return;
        };
        let _ = input.focus();
        let len = input.value().len() as u32;
        let _ = input.set_selection_range(len, len);
    };
    // タグの増減で再描画された後にカーソルを末尾へ置く（次tickで実行）
    let focus_input_deferred = move || {
        spawn_local(async move {
            TimeoutFuture::new(0).await;
            focus_input_to_end();
        });
    };

    let reset_invite_state = move || {
        reset_invite_draft(set_invite_tags, set_input_value, set_validation_error);
    };
    let enter_invite_mode = move |_| {
        reset_invite_state();
        set_mode.set(ModalMode::Invite);
        log_info("ui-action", "share modal: enter invite mode");
    };
    let back_to_share = move |_| {
        reset_invite_state();
        set_mode.set(ModalMode::Share);
    };

    // 招待モードに入ったら入力欄へフォーカス
    create_effect(move |_| {
        if mode.get() == ModalMode::Invite {
            focus_input_deferred();
        }
    });

    // 開いている間だけ外側クリック検出とbodyスクロール固定を有効にする
    let outside_click = store_value(None::<DomListener>);
    create_effect(move |_| {
        if is_open.get() {
            let listener = DomListener::document("mousedown", move |ev| {
                let Some(modal) = modal_ref.get_untracked() else {
                    return;
                };
                let target = ev.target().and_then(|t| t.dyn_into::<web_sys::Node>().ok());
                if !modal.contains(target.as_ref()) {
                    on_close.call(());
                }
            });
            outside_click.set_value(listener);
            set_body_overflow("hidden");
        } else {
            outside_click.set_value(None);
            set_body_overflow("unset");
            // クローズでドラフトは破棄。次回は必ず共有モードから開く
            reset_invite_state();
            set_mode.set(ModalMode::Share);
        }
    });
    on_cleanup(move || {
        outside_click.set_value(None);
        set_body_overflow("unset");
    });

    let add_tag = move |tag: InviteTag| {
        set_invite_tags.update(|tags| tags.push(tag));
        set_validation_error.set(None);
        focus_input_deferred();
    };
    let remove_tag = move |tag_id: String| {
        set_invite_tags.update(|tags| tags.retain(|t| t.id != tag_id));
        focus_input_deferred();
    };
    let confirm_input = move || {
        let text = input_value.get_untracked();
        if !should_confirm(&text) {
            return;
        }
        let (_, sugg_groups) = suggested.get_value();
        let result = directory
            .with_untracked(|d| confirm_invite_text(&text, &d.groups, &sugg_groups, now_ms()));
        match result {
            Ok(tag) => {
                set_input_value.set(String::new());
                add_tag(tag);
            }
            Err(err) => {
                log_warn("invite", &format!("rejected invite entry: {}", text.trim()));
                set_validation_error.set(Some(err));
            }
        }
    };

    let on_input = move |ev: web_sys::Event| {
        set_input_value.set(event_target_value(&ev));
        // 入力中はエラーを消す。検証はEnter時だけ
        set_validation_error.set(None);
    };
    let on_input_keydown = move |ev: web_sys::KeyboardEvent| {
        if ev.key() == "Enter" && should_confirm(&input_value.get_untracked()) {
            ev.prevent_default();
            confirm_input();
        }
    };
    // タグ領域のどこを押しても入力欄の末尾にフォーカスする
    let compose_mousedown = move |ev: web_sys::MouseEvent| {
        ev.prevent_default();
        focus_input_to_end();
    };

    let submit_invite = move |_| {
        let tags = invite_tags.get_untracked();
        if tags.is_empty() {
            return;
        }
        let permission = invite_permission.get_untracked();
        directory.update(|d| d.create_from_invite(&tags, permission, now_ms()));
        reset_invite_state();
        set_mode.set(ModalMode::Share);
        log_info_with_data(
            "invite",
            "invitations sent",
            serde_json::json!({ "count": tags.len(), "permission": permission.as_str() }),
        );
        if let Some(cb) = on_invite_success {
            cb.call(());
        }
    };

    let open_my_teams = move |_| {
        if let Some(window) = web_sys::window() {
            let _ = window.open_with_url_and_target("/my-teams?tab=knowledge-base", "_blank");
        }
    };

    view! {
        {move || is_open.get().then(|| view! {
            <div class="modal-backdrop">
                <div class="share-modal" node_ref=modal_ref>
                    <div class="modal-header">
                        {move || match mode.get() {
                            ModalMode::Invite => view! {
                                <div class="header-title">
                                    <button class="back-btn" on:click=back_to_share>"←"</button>
                                    <h2>"Invite"</h2>
                                </div>
                            }.into_view(),
                            ModalMode::Share => view! {
                                <h2>{move || format!("Share \"{}\"", kb_name.get())}</h2>
                            }.into_view(),
                        }}
                        <button class="close-btn" on:click=move |_| on_close.call(())>"✕"</button>
                    </div>

                    {move || (mode.get() == ModalMode::Share).then(|| view! {
                        <div class="search-invite-row">
                            // 検索欄は招待モードへの入口（読み取り専用）
                            <input
                                type="text"
                                class="search-input"
                                placeholder="Search users or role groups..."
                                readonly=true
                                on:click=enter_invite_mode
                            />
                            <button class="invite-btn" on:click=enter_invite_mode>"Invite"</button>
                        </div>
                    })}

                    {move || (mode.get() == ModalMode::Invite).then(|| view! {
                        <div class="invite-compose-row">
                            <div class="invite-input-area" on:mousedown=compose_mousedown>
                                <div class="invite-input-box">
                                    {move || {
                                        let tags = invite_tags.get();
                                        (!tags.is_empty()).then(|| view! {
                                            <div class="invite-tags">
                                                {tags.into_iter().map(|tag| {
                                                    let tag_id = tag.id.clone();
                                                    let initial = match tag.kind {
                                                        InviteKind::Group => "👥".to_string(),
                                                        InviteKind::User => tag.name.chars().next()
                                                            .map(|c| c.to_uppercase().to_string())
                                                            .unwrap_or_default(),
                                                    };
                                                    view! {
                                                        <span class="invite-tag">
                                                            <span class="tag-avatar">{initial}</span>
                                                            <span class="tag-name">{tag.name.clone()}</span>
                                                            <button
                                                                class="tag-remove"
                                                                on:click=move |_| remove_tag(tag_id.clone())
                                                            >"✕"</button>
                                                        </span>
                                                    }
                                                }).collect_view()}
                                            </div>
                                        })
                                    }}
                                    <input
                                        type="text"
                                        class="invite-input"
                                        node_ref=input_ref
                                        placeholder=move || {
                                            if invite_tags.with(|t| t.is_empty()) {
                                                "Enter username, email, or group name..."
                                            } else {
                                                ""
                                            }
                                        }
                                        prop:value=move || input_value.get()
                                        on:input=on_input
                                        on:keydown=on_input_keydown
                                    />
                                    <select
                                        class="invite-permission"
                                        on:mousedown=|ev: web_sys::MouseEvent| ev.stop_propagation()
                                        on:change=move |ev| {
                                            if let Some(p) = Permission::parse(&event_target_value(&ev)) {
                                                set_invite_permission.set(p);
                                            }
                                        }
                                    >
                                        {Permission::ALL.iter().map(|p| {
                                            let val = p.as_str();
                                            view! {
                                                <option
                                                    value=val
                                                    selected=move || invite_permission.get().as_str() == val
                                                >{val}</option>
                                            }
                                        }).collect_view()}
                                    </select>
                                </div>

                                {move || validation_error.get().map(|err| view! {
                                    <div class="validation-error">{err.to_string()}</div>
                                })}

                                {move || {
                                    let results = search_results.get();
                                    (!results.is_empty()).then(|| view! {
                                        <div class="suggestion-dropdown">
                                            {results.into_iter().map(|suggestion| {
                                                let tag = suggestion.to_tag();
                                                let identity = suggestion_identity(&suggestion);
                                                view! {
                                                    <div
                                                        class="suggestion-row"
                                                        on:click=move |_| {
                                                            set_input_value.set(String::new());
                                                            add_tag(tag.clone());
                                                        }
                                                    >
                                                        {identity}
                                                        <span class="add-icon">"＋"</span>
                                                    </div>
                                                }
                                            }).collect_view()}
                                        </div>
                                    })
                                }}
                            </div>
                            <button class="invite-submit-btn" on:click=submit_invite>"Invite"</button>
                        </div>
                    })}

                    <div class="modal-content">
                        {move || match mode.get() {
                            ModalMode::Share => view! {
                                <div class="share-content">
                                    {move || {
                                        let users = sorted_users.get();
                                        (!users.is_empty()).then(|| view! {
                                            <div class="member-section">
                                                <h3>"Users"</h3>
                                                <div class="member-list">
                                                    {users.into_iter().map(|user| view! {
                                                        <UserRow user=user directory=directory />
                                                    }).collect_view()}
                                                </div>
                                            </div>
                                        })
                                    }}
                                    {move || {
                                        let groups = sorted_groups.get();
                                        (!groups.is_empty()).then(|| view! {
                                            <div class="member-section">
                                                <h3>"Role Groups"</h3>
                                                <div class="member-list">
                                                    {groups.into_iter().map(|group| view! {
                                                        <GroupRow
                                                            group=group
                                                            directory=directory
                                                            expanded=expanded_groups
                                                            set_expanded=set_expanded_groups
                                                        />
                                                    }).collect_view()}
                                                </div>
                                            </div>
                                        })
                                    }}
                                    {move || {
                                        let empty = sorted_users.with(|u| u.is_empty())
                                            && sorted_groups.with(|g| g.is_empty());
                                        empty.then(|| view! {
                                            <div class="empty-state">
                                                <div class="empty-title">"No permissions granted yet"</div>
                                                <div class="empty-hint">
                                                    "Use the search box above to invite users or role groups"
                                                </div>
                                            </div>
                                        })
                                    }}
                                </div>
                            }.into_view(),
                            ModalMode::Invite => view! {
                                <div class="invite-content">
                                    {move || {
                                        let pool = suggestion_pool.get();
                                        if pool.is_empty() {
                                            view! {
                                                <div class="empty-state">
                                                    <div class="empty-title">"No suggestions available"</div>
                                                    <div class="empty-hint">
                                                        "All members from your teams already have access"
                                                    </div>
                                                </div>
                                            }.into_view()
                                        } else {
                                            view! {
                                                <div class="suggested-section">
                                                    <h3>"Suggested"</h3>
                                                    <div class="suggested-list">
                                                        {pool.into_iter().map(|suggestion| {
                                                            let sid = suggestion.id().to_string();
                                                            let selected = invite_tags
                                                                .with(|tags| tags.iter().any(|t| t.id == sid));
                                                            let tag = suggestion.to_tag();
                                                            let identity = suggestion_identity(&suggestion);
                                                            view! {
                                                                <div
                                                                    class="suggested-row"
                                                                    on:click=move |_| add_tag(tag.clone())
                                                                >
                                                                    {identity}
                                                                    <span class=if selected {
                                                                        "select-mark selected"
                                                                    } else {
                                                                        "select-mark"
                                                                    }>
                                                                        {selected.then_some("✓")}
                                                                    </span>
                                                                </div>
                                                            }
                                                        }).collect_view()}
                                                    </div>
                                                </div>
                                            }.into_view()
                                        }
                                    }}
                                </div>
                            }.into_view(),
                        }}
                    </div>

                    <div class="modal-footer">
                        <button class="manage-teams-btn" on:click=open_my_teams>
                            <span>"Manage My Teams"</span>
                            <span class="external-icon">"↗"</span>
                        </button>
                    </div>
                </div>
            </div>
        })}
    }
}

/// 空白だけの入力はEnterでも確定しない（タグ化もエラー表示もしない）
fn should_confirm(text: &str) -> bool {
    !text.trim().is_empty()
}

/// 招待ドラフト（タグ・入力・エラー）を空に戻す。送信時とクローズ時に呼ぶ
fn reset_invite_draft(
    set_tags: WriteSignal<Vec<InviteTag>>,
    set_input: WriteSignal<String>,
    set_error: WriteSignal<Option<InviteError>>,
) {
    set_tags.set(Vec::new());
    set_input.set(String::new());
    set_error.set(None);
}

/// 候補行の左側（アバターと名前/メール、グループなら人数）
fn suggestion_identity(suggestion: &Suggestion) -> View {
    match suggestion {
        Suggestion::User(user) => view! {
            <div class="suggest-identity">
                <img class="avatar" src=user.avatar.clone() alt=user.name.clone() />
                <div>
                    <div class="member-name">{user.name.clone()}</div>
                    <div class="member-email">{user.email.clone()}</div>
                </div>
            </div>
        }.into_view(),
        Suggestion::Group(group) => view! {
            <div class="suggest-identity">
                <span class="group-avatar">"👥"</span>
                <div>
                    <div class="member-name">{group.name.clone()}</div>
                    <div class="member-email">
                        {format!("Group • {} person{}", group.member_count,
                            if group.member_count == 1 { "" } else { "s" })}
                    </div>
                </div>
            </div>
        }.into_view(),
    }
}

/// ユーザー行。セレクタはRevoke込みの4択
#[component]
fn UserRow(user: User, directory: RwSignal<MockDirectory>) -> impl IntoView {
    let user_id = user.id.clone();
    let current = user.permission;
    let on_change = move |ev: web_sys::Event| {
        if let Some(choice) = PermissionChoice::parse(&event_target_value(&ev)) {
            if choice == PermissionChoice::Revoke {
                log_info("ui-action", "share modal: revoke user");
            }
            directory.update(|d| d.upsert_user_permission(&user_id, choice));
        }
    };

    view! {
        <div class="member-row">
            <div class="member-info">
                <img class="avatar" src=user.avatar.clone() alt=user.name.clone() />
                <div>
                    <div class="member-name">{user.name.clone()}</div>
                    <div class="member-email">{user.email.clone()}</div>
                </div>
            </div>
            <select class="permission-select" on:change=on_change>
                {Permission::ALL.iter().map(|p| view! {
                    <option value=p.as_str() selected=*p == current>{p.as_str()}</option>
                }).collect_view()}
                <option value="Revoke" class="revoke-option">"Revoke"</option>
            </select>
        </div>
    }
}

/// グループ行。展開でメンバー一覧（読み取り専用）を見せる
#[component]
fn GroupRow(
    group: RoleGroup,
    directory: RwSignal<MockDirectory>,
    expanded: ReadSignal<HashSet<String>>,
    set_expanded: WriteSignal<HashSet<String>>,
) -> impl IntoView {
    let group_id = store_value(group.id.clone());
    let current = group.permission;
    let members = group.members.clone();

    let on_change = move |ev: web_sys::Event| {
        if let Some(p) = Permission::parse(&event_target_value(&ev)) {
            directory.update(|d| d.upsert_group_permission(&group_id.get_value(), p));
        }
    };
    let toggle = move |_| {
        set_expanded.update(|set| toggle_group(set, &group_id.get_value()));
    };
    let is_expanded = move || expanded.with(|set| set.contains(&group_id.get_value()));

    view! {
        <div class="group-block">
            <div class="member-row">
                <div class="member-info">
                    <span class="group-avatar">"👥"</span>
                    <div>
                        <div class="member-name">{group.name.clone()}</div>
                        <div class="member-email">{format!("{} members", group.member_count)}</div>
                    </div>
                    <button class="expand-btn" on:click=toggle>
                        {move || if is_expanded() { "▼" } else { "▶" }}
                    </button>
                </div>
                <select class="permission-select" on:change=on_change>
                    {Permission::ALL.iter().map(|p| view! {
                        <option value=p.as_str() selected=*p == current>{p.as_str()}</option>
                    }).collect_view()}
                </select>
            </div>
            {move || is_expanded().then(|| view! {
                <div class="group-members">
                    {members.iter().map(|member| view! {
                        <div class="group-member">
                            <img class="avatar small" src=member.avatar.clone() alt=member.name.clone() />
                            <div>
                                <div class="member-name">{member.name.clone()}</div>
                                <div class="member-email">{member.email.clone()}</div>
                            </div>
                        </div>
                    }).collect_view()}
                </div>
            })}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input_is_never_confirmed() {
        assert!(!should_confirm(""));
        assert!(!should_confirm("   "));
        assert!(!should_confirm("\t\n"));
        assert!(should_confirm("alice@example.com"));
        assert!(should_confirm("  design team  "));
    }

    #[test]
    fn test_closing_discards_invite_draft() {
        let runtime = create_runtime();
        let (tags, set_tags) = create_signal(vec![InviteTag {
            id: "email-1".to_string(),
            name: "pending@example.com".to_string(),
            kind: InviteKind::User,
            email: Some("pending@example.com".to_string()),
        }]);
        let (input, set_input) = create_signal("half-typed".to_string());
        let (error, set_error) = create_signal(Some(InviteError::NotAValidEmail));

        reset_invite_draft(set_tags, set_input, set_error);

        assert!(tags.get_untracked().is_empty());
        assert!(input.get_untracked().is_empty());
        assert!(error.get_untracked().is_none());
        runtime.dispose();
    }
}
