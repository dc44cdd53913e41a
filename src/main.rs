//! ナレッジベース共有UI（Leptos CSR）
//!
//! カード一覧・共有権限モーダル・ツールチップの3コンポーネントと
//! それらを載せるデモ用ダッシュボードで構成する

mod components;
mod models;
mod utils;
mod views;

use leptos::*;

use views::Dashboard;

#[component]
fn App() -> impl IntoView {
    view! {
        <div class="app">
            <header class="app-header">
                <h1>"Knowledge Base Sharing"</h1>
            </header>
            <main>
                <Dashboard/>
            </main>
        </div>
    }
}

fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(App);
}
