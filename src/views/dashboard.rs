//! ダッシュボード画面
//!
//! ナレッジベースのカード一覧と共有権限モーダルを束ねる

use leptos::*;

use gloo::timers::future::TimeoutFuture;

use crate::components::{KnowledgeBaseCard, SharePermissionModal};
use crate::models::{mock_folders, KnowledgeFolder};
use crate::utils::log_trace::{get_logs_json, log_info};

/// カード一覧とモーダルのホスト
#[component]
pub fn Dashboard() -> impl IntoView {
    let (folders, set_folders) = create_signal(mock_folders());
    // 共有モーダルの対象フォルダ。Noneで閉じる
    let (share_target, set_share_target) = create_signal(None::<KnowledgeFolder>);
    let (notice, set_notice) = create_signal(None::<String>);

    let modal_open = Signal::derive(move || share_target.with(|t| t.is_some()));
    let modal_name = Signal::derive(move || {
        share_target.with(|t| t.as_ref().map(|f| f.title.clone()).unwrap_or_default())
    });

    let show_notice = move |message: String| {
        set_notice.set(Some(message));
        spawn_local(async move {
            TimeoutFuture::new(2_000).await;
            set_notice.set(None);
        });
    };

    let open_share = move |id: String| {
        let target = folders.with_untracked(|fs| fs.iter().find(|f| f.id == id).cloned());
        if let Some(folder) = target {
            log_info("ui-action", &format!("open share modal: {}", folder.id));
            set_share_target.set(Some(folder));
        }
    };
    let on_edit = move |id: String| {
        show_notice(format!("Edit requested: {id}"));
    };
    let on_delete = move |id: String| {
        set_folders.update(|fs| fs.retain(|f| f.id != id));
        show_notice("Knowledge base deleted".to_string());
    };
    let on_open = move |id: String| {
        show_notice(format!("Opened: {id}"));
    };
    // 不具合調査用。蓄積した操作ログをコンソールへ吐く
    let dump_logs = move |_| {
        web_sys::console::log_1(&get_logs_json().into());
    };

    view! {
        <div class="dashboard">
            {move || notice.get().map(|message| view! {
                <div class="notice-banner">{message}</div>
            })}
            <div class="card-grid">
                {move || folders.get().into_iter().map(|folder| {
                    let folder_id = folder.id.clone();
                    view! {
                        <KnowledgeBaseCard
                            id=folder.id
                            title=folder.title
                            emoji=folder.emoji
                            visibility=folder.visibility
                            is_central=folder.is_central
                            role_tags=folder.role_tags
                            on_click=Callback::new(move |_| on_open(folder_id.clone()))
                            on_edit=Callback::new(on_edit)
                            on_delete=Callback::new(on_delete)
                            on_permissions=Callback::new(open_share)
                        />
                    }
                }).collect_view()}
            </div>
            <div class="dashboard-footer">
                <button class="debug-log-btn" on:click=dump_logs>"Dump activity log"</button>
            </div>
            <SharePermissionModal
                is_open=modal_open
                knowledge_base_name=modal_name
                on_close=Callback::new(move |_| set_share_target.set(None))
                on_invite_success=Callback::new(move |_| {
                    show_notice("Invitations sent".to_string());
                })
            />
        </div>
    }
}
