//! データ構造体モジュール
//!
//! 共有権限まわりのエンティティと、招待入力・検索のピュアロジックを提供

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 招待で作成されるユーザーのデフォルトアバター
pub const PLACEHOLDER_AVATAR: &str =
    "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=32&h=32&fit=crop&crop=face";

/// 招待で作成されるグループのデフォルト人数
pub const DEFAULT_GROUP_MEMBER_COUNT: u32 = 5;

// ============================================
// 権限レベル
// ============================================

/// フォルダに対するアクセス権限（3段階）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "View-only")]
    ViewOnly,
    #[serde(rename = "Can edit")]
    CanEdit,
    #[serde(rename = "Full access")]
    FullAccess,
}

impl Permission {
    pub const ALL: [Permission; 3] =
        [Permission::ViewOnly, Permission::CanEdit, Permission::FullAccess];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewOnly => "View-only",
            Permission::CanEdit => "Can edit",
            Permission::FullAccess => "Full access",
        }
    }

    pub fn parse(s: &str) -> Option<Permission> {
        match s {
            "View-only" => Some(Permission::ViewOnly),
            "Can edit" => Some(Permission::CanEdit),
            "Full access" => Some(Permission::FullAccess),
            _ => None,
        }
    }
}

/// ユーザー行セレクタの選択肢。Revokeは権限レベルではなく
/// 「行を削除する」UIアクションとして同じセレクタに同居する
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionChoice {
    Grant(Permission),
    Revoke,
}

impl PermissionChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionChoice::Grant(p) => p.as_str(),
            PermissionChoice::Revoke => "Revoke",
        }
    }

    pub fn parse(s: &str) -> Option<PermissionChoice> {
        if s == "Revoke" {
            Some(PermissionChoice::Revoke)
        } else {
            Permission::parse(s).map(PermissionChoice::Grant)
        }
    }
}

// ============================================
// エンティティ
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub permission: Permission,
    /// 追加日時（エポックミリ秒）
    pub added_at: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleGroup {
    pub id: String,
    pub name: String,
    pub member_count: u32,
    pub permission: Permission,
    pub added_at: f64,
    #[serde(default)]
    pub members: Vec<User>,
}

/// 招待タグの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteKind {
    User,
    Group,
}

/// 招待入力中の一時エントリ。送信またはモーダルクローズで破棄される
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteTag {
    pub id: String,
    pub name: String,
    pub kind: InviteKind,
    #[serde(default)]
    pub email: Option<String>,
}

/// フォルダの公開状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Private,
}

/// ダッシュボードがカードに渡すフォルダ情報
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeFolder {
    pub id: String,
    pub title: String,
    pub emoji: String,
    pub visibility: Visibility,
    #[serde(default)]
    pub is_central: bool,
    #[serde(default)]
    pub role_tags: Vec<String>,
}

// ============================================
// 招待入力のバリデーション
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InviteError {
    #[error("This is not a valid email")]
    NotAValidEmail,
}

/// メールアドレス形式の判定（local@domain.tld、空白不可）
pub fn is_valid_email(text: &str) -> bool {
    if text.chars().any(|c| c.is_whitespace()) {
        return false;
    }
    let mut parts = text.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };
    if local.is_empty() {
        return false;
    }
    match domain.rfind('.') {
        Some(dot) => dot > 0 && dot + 1 < domain.len(),
        None => false,
    }
}

/// 確定キー押下時の入力テキストからタグを生成する
///
/// - `@` を含む場合はメール形式のみ許可し、ユーザータグになる
/// - 含まない場合は既存/候補グループ名（大文字小文字無視）のみ許可し、
///   一致したグループのID・正式名を引き継ぐグループタグになる
pub fn confirm_invite_text(
    input: &str,
    groups: &[RoleGroup],
    suggested_groups: &[RoleGroup],
    now_ms: f64,
) -> Result<InviteTag, InviteError> {
    let trimmed = input.trim();

    if trimmed.contains('@') {
        if !is_valid_email(trimmed) {
            return Err(InviteError::NotAValidEmail);
        }
        return Ok(InviteTag {
            id: format!("email-{}", now_ms as u64),
            name: trimmed.to_string(),
            kind: InviteKind::User,
            email: Some(trimmed.to_string()),
        });
    }

    let lower = trimmed.to_lowercase();
    groups
        .iter()
        .chain(suggested_groups.iter())
        .find(|g| g.name.to_lowercase() == lower)
        .map(|group| InviteTag {
            id: group.id.clone(),
            name: group.name.clone(),
            kind: InviteKind::Group,
            email: None,
        })
        .ok_or(InviteError::NotAValidEmail)
}

// ============================================
// 候補検索
// ============================================

/// 候補リストの1件（ユーザーまたはグループ）
#[derive(Debug, Clone, PartialEq)]
pub enum Suggestion {
    User(User),
    Group(RoleGroup),
}

impl Suggestion {
    pub fn id(&self) -> &str {
        match self {
            Suggestion::User(u) => &u.id,
            Suggestion::Group(g) => &g.id,
        }
    }

    pub fn to_tag(&self) -> InviteTag {
        match self {
            Suggestion::User(u) => InviteTag {
                id: u.id.clone(),
                name: u.name.clone(),
                kind: InviteKind::User,
                email: Some(u.email.clone()),
            },
            Suggestion::Group(g) => InviteTag {
                id: g.id.clone(),
                name: g.name.clone(),
                kind: InviteKind::Group,
                email: None,
            },
        }
    }
}

/// 候補プールから、すでに権限を持つユーザー/グループを除外する
pub fn available_suggestions(
    suggested_users: &[User],
    suggested_groups: &[RoleGroup],
    users: &[User],
    groups: &[RoleGroup],
) -> Vec<Suggestion> {
    let mut out = Vec::new();
    for user in suggested_users {
        if !users.iter().any(|u| u.id == user.id) {
            out.push(Suggestion::User(user.clone()));
        }
    }
    for group in suggested_groups {
        if !groups.iter().any(|g| g.id == group.id) {
            out.push(Suggestion::Group(group.clone()));
        }
    }
    out
}

/// 入力テキストによるライブ検索（部分一致、大文字小文字無視）
///
/// クエリが空のときは何も返さない
pub fn filter_suggestions(query: &str, pool: &[Suggestion]) -> Vec<Suggestion> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    pool.iter()
        .filter(|s| match s {
            Suggestion::User(u) => {
                u.name.to_lowercase().contains(&query) || u.email.to_lowercase().contains(&query)
            }
            Suggestion::Group(g) => g.name.to_lowercase().contains(&query),
        })
        .cloned()
        .collect()
}

/// グループ展開状態のトグル
pub fn toggle_group(expanded: &mut HashSet<String>, group_id: &str) {
    if !expanded.remove(group_id) {
        expanded.insert(group_id.to_string());
    }
}

// ============================================
// リポジトリ
// ============================================

/// 権限リストの保管先。実運用ではディレクトリサービスAPIに差し替える想定で、
/// モーダル側の操作ロジックはこのトレイト越しにしか触らない
pub trait PermissionRepository {
    /// 追加日時の新しい順で返す
    fn list_users(&self) -> Vec<User>;
    /// 追加日時の新しい順で返す
    fn list_groups(&self) -> Vec<RoleGroup>;
    fn upsert_user_permission(&mut self, user_id: &str, choice: PermissionChoice);
    fn upsert_group_permission(&mut self, group_id: &str, permission: Permission);
    fn remove_user(&mut self, user_id: &str);
    fn create_from_invite(&mut self, tags: &[InviteTag], permission: Permission, now_ms: f64);
}

/// インメモリのモックディレクトリ
#[derive(Debug, Clone, Default)]
pub struct MockDirectory {
    pub users: Vec<User>,
    pub groups: Vec<RoleGroup>,
}

impl MockDirectory {
    /// モックデータ入りで生成
    pub fn seeded() -> Self {
        MockDirectory {
            users: vec![
                mock_user("1", "Alice Johnson", "alice.johnson@company.com",
                    "https://images.unsplash.com/photo-1494790108755-2616b612e64f?w=32&h=32&fit=crop&crop=face",
                    Permission::FullAccess, 1705276800000.0), // 2024-01-15
                mock_user("2", "Bob Smith", "bob.smith@company.com",
                    "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=32&h=32&fit=crop&crop=face",
                    Permission::CanEdit, 1704844800000.0), // 2024-01-10
                mock_user("3", "Carol Wilson", "carol.wilson@company.com",
                    "https://images.unsplash.com/photo-1438761681033-6461ffad8d80?w=32&h=32&fit=crop&crop=face",
                    Permission::ViewOnly, 1704412800000.0), // 2024-01-05
            ],
            groups: vec![
                RoleGroup {
                    id: "1".to_string(),
                    name: "Engineering Team".to_string(),
                    member_count: 12,
                    permission: Permission::CanEdit,
                    added_at: 1705017600000.0, // 2024-01-12
                    members: vec![
                        mock_user("4", "David Chen", "david.chen@company.com",
                            "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=32&h=32&fit=crop&crop=face",
                            Permission::CanEdit, 1705017600000.0),
                        mock_user("5", "Emily Davis", "emily.davis@company.com",
                            "https://images.unsplash.com/photo-1517841905240-472988babdf9?w=32&h=32&fit=crop&crop=face",
                            Permission::CanEdit, 1705017600000.0),
                    ],
                },
                RoleGroup {
                    id: "2".to_string(),
                    name: "Marketing Team".to_string(),
                    member_count: 8,
                    permission: Permission::ViewOnly,
                    added_at: 1704672000000.0, // 2024-01-08
                    members: vec![
                        mock_user("6", "Frank Miller", "frank.miller@company.com",
                            "https://images.unsplash.com/photo-1500648767791-00dcc994a43e?w=32&h=32&fit=crop&crop=face",
                            Permission::ViewOnly, 1704672000000.0),
                    ],
                },
            ],
        }
    }

    /// 招待候補のモックデータ（My Teams API相当）
    pub fn suggested(now_ms: f64) -> (Vec<User>, Vec<RoleGroup>) {
        let users = vec![
            mock_user("suggest-1", "John Doe", "john.doe@company.com",
                "https://images.unsplash.com/photo-1506794778202-cad84cf45f1d?w=32&h=32&fit=crop&crop=face",
                Permission::ViewOnly, now_ms),
            mock_user("suggest-2", "Sarah Wilson", "sarah.wilson@company.com",
                "https://images.unsplash.com/photo-1544005313-94ddf0286df2?w=32&h=32&fit=crop&crop=face",
                Permission::ViewOnly, now_ms),
        ];
        let groups = vec![RoleGroup {
            id: "suggest-group-1".to_string(),
            name: "Design Team".to_string(),
            member_count: 6,
            permission: Permission::ViewOnly,
            added_at: now_ms,
            members: Vec::new(),
        }];
        (users, groups)
    }
}

fn mock_user(
    id: &str,
    name: &str,
    email: &str,
    avatar: &str,
    permission: Permission,
    added_at: f64,
) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        avatar: avatar.to_string(),
        permission,
        added_at,
    }
}

fn by_recency(a: f64, b: f64) -> std::cmp::Ordering {
    b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
}

impl PermissionRepository for MockDirectory {
    fn list_users(&self) -> Vec<User> {
        let mut users = self.users.clone();
        users.sort_by(|a, b| by_recency(a.added_at, b.added_at));
        users
    }

    fn list_groups(&self) -> Vec<RoleGroup> {
        let mut groups = self.groups.clone();
        groups.sort_by(|a, b| by_recency(a.added_at, b.added_at));
        groups
    }

    fn upsert_user_permission(&mut self, user_id: &str, choice: PermissionChoice) {
        match choice {
            PermissionChoice::Revoke => self.remove_user(user_id),
            PermissionChoice::Grant(permission) => {
                if let Some(user) = self.users.iter_mut().find(|u| u.id == user_id) {
                    user.permission = permission;
                }
            }
        }
    }

    fn upsert_group_permission(&mut self, group_id: &str, permission: Permission) {
        if let Some(group) = self.groups.iter_mut().find(|g| g.id == group_id) {
            group.permission = permission;
        }
    }

    fn remove_user(&mut self, user_id: &str) {
        self.users.retain(|u| u.id != user_id);
    }

    fn create_from_invite(&mut self, tags: &[InviteTag], permission: Permission, now_ms: f64) {
        for tag in tags {
            match tag.kind {
                InviteKind::User => {
                    let email = tag
                        .email
                        .clone()
                        .unwrap_or_else(|| format!("{}@company.com", tag.name));
                    self.users.insert(0, User {
                        id: tag.id.clone(),
                        name: tag.name.clone(),
                        email,
                        avatar: PLACEHOLDER_AVATAR.to_string(),
                        permission,
                        added_at: now_ms,
                    });
                }
                InviteKind::Group => {
                    self.groups.insert(0, RoleGroup {
                        id: tag.id.clone(),
                        name: tag.name.clone(),
                        member_count: DEFAULT_GROUP_MEMBER_COUNT,
                        permission,
                        added_at: now_ms,
                        members: Vec::new(),
                    });
                }
            }
        }
    }
}

/// ダッシュボードに並べるモックフォルダ
pub fn mock_folders() -> Vec<KnowledgeFolder> {
    let folder = |id: &str, title: &str, emoji: &str, visibility, is_central, tags: &[&str]| {
        KnowledgeFolder {
            id: id.to_string(),
            title: title.to_string(),
            emoji: emoji.to_string(),
            visibility,
            is_central,
            role_tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    };
    vec![
        folder("kb-product", "Product Handbook", "📘", Visibility::Public, true, &[]),
        folder("kb-design", "Design Guidelines", "🎨", Visibility::Private, true, &[]),
        folder("kb-onboarding", "Onboarding", "🚀", Visibility::Public, true, &[]),
        folder("kb-people", "People Directory", "👥", Visibility::Private, false, &[]),
        folder("kb-announcements", "Announcements", "📣", Visibility::Public, false, &["system"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_roundtrip() {
        for p in Permission::ALL {
            assert_eq!(Permission::parse(p.as_str()), Some(p));
        }
        assert_eq!(PermissionChoice::parse("Revoke"), Some(PermissionChoice::Revoke));
        assert_eq!(
            PermissionChoice::parse("Can edit"),
            Some(PermissionChoice::Grant(Permission::CanEdit))
        );
        assert_eq!(PermissionChoice::parse("owner"), None);
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last@sub.example.co"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user@example."));
        assert!(!is_valid_email("us er@example.com"));
        assert!(!is_valid_email("user@@example.com"));
    }

    #[test]
    fn test_confirm_email_becomes_user_tag() {
        let tag = confirm_invite_text("  user@example.com  ", &[], &[], 1_000.0).unwrap();
        assert_eq!(tag.kind, InviteKind::User);
        assert_eq!(tag.name, "user@example.com");
        assert_eq!(tag.email.as_deref(), Some("user@example.com"));
        assert_eq!(tag.id, "email-1000");
    }

    #[test]
    fn test_confirm_rejects_invalid_text() {
        let dir = MockDirectory::seeded();
        let err = confirm_invite_text("not-an-email", &dir.groups, &[], 0.0).unwrap_err();
        assert_eq!(err, InviteError::NotAValidEmail);
        assert_eq!(err.to_string(), "This is not a valid email");

        let err = confirm_invite_text("bad@@mail.com", &dir.groups, &[], 0.0).unwrap_err();
        assert_eq!(err, InviteError::NotAValidEmail);
    }

    #[test]
    fn test_confirm_matches_group_name_case_insensitively() {
        let dir = MockDirectory::seeded();
        let tag = confirm_invite_text("engineering team", &dir.groups, &[], 0.0).unwrap();
        assert_eq!(tag.kind, InviteKind::Group);
        assert_eq!(tag.id, "1");
        assert_eq!(tag.name, "Engineering Team");
    }

    #[test]
    fn test_confirm_matches_suggested_group() {
        let (_, suggested) = MockDirectory::suggested(0.0);
        let tag = confirm_invite_text("DESIGN TEAM", &[], &suggested, 0.0).unwrap();
        assert_eq!(tag.kind, InviteKind::Group);
        assert_eq!(tag.id, "suggest-group-1");
        assert_eq!(tag.name, "Design Team");
    }

    #[test]
    fn test_revoke_removes_exactly_one_user() {
        let mut dir = MockDirectory::seeded();
        dir.upsert_user_permission("2", PermissionChoice::Revoke);
        let ids: Vec<_> = dir.users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(dir.users[0].permission, Permission::FullAccess);
    }

    #[test]
    fn test_grant_updates_permission_in_place() {
        let mut dir = MockDirectory::seeded();
        dir.upsert_user_permission("3", PermissionChoice::Grant(Permission::FullAccess));
        assert_eq!(dir.users.len(), 3);
        assert_eq!(dir.users[2].permission, Permission::FullAccess);

        dir.upsert_group_permission("2", Permission::FullAccess);
        assert_eq!(dir.groups[1].permission, Permission::FullAccess);
    }

    #[test]
    fn test_listing_sorts_by_recency() {
        let dir = MockDirectory::seeded();
        let users: Vec<_> = dir.list_users().iter().map(|u| u.id.clone()).collect();
        assert_eq!(users, vec!["1", "2", "3"]);
        let groups: Vec<_> = dir.list_groups().iter().map(|g| g.id.clone()).collect();
        assert_eq!(groups, vec!["1", "2"]);
    }

    #[test]
    fn test_create_from_invite_materializes_tags() {
        let mut dir = MockDirectory::seeded();
        let submit_time = 1_705_300_000_000.0;
        let tags = vec![
            InviteTag {
                id: "email-1".to_string(),
                name: "new.user@example.com".to_string(),
                kind: InviteKind::User,
                email: Some("new.user@example.com".to_string()),
            },
            InviteTag {
                id: "suggest-1".to_string(),
                name: "John Doe".to_string(),
                kind: InviteKind::User,
                email: None,
            },
            InviteTag {
                id: "suggest-group-1".to_string(),
                name: "Design Team".to_string(),
                kind: InviteKind::Group,
                email: None,
            },
        ];
        dir.create_from_invite(&tags, Permission::CanEdit, submit_time);

        assert_eq!(dir.users.len(), 5);
        assert_eq!(dir.groups.len(), 3);
        // 先頭に追加され、全員が選択した権限と送信時刻を持つ
        assert_eq!(dir.users[0].id, "suggest-1");
        assert_eq!(dir.users[0].email, "John Doe@company.com");
        assert_eq!(dir.users[1].email, "new.user@example.com");
        assert_eq!(dir.groups[0].member_count, DEFAULT_GROUP_MEMBER_COUNT);
        assert!(dir.groups[0].members.is_empty());
        for user in &dir.users[..2] {
            assert_eq!(user.permission, Permission::CanEdit);
            assert!(user.added_at >= submit_time);
            assert_eq!(user.avatar, PLACEHOLDER_AVATAR);
        }
        assert_eq!(dir.groups[0].permission, Permission::CanEdit);
        assert!(dir.groups[0].added_at >= submit_time);
    }

    #[test]
    fn test_suggestions_exclude_existing_ids() {
        let mut dir = MockDirectory::seeded();
        let (sugg_users, sugg_groups) = MockDirectory::suggested(0.0);
        let pool = available_suggestions(&sugg_users, &sugg_groups, &dir.users, &dir.groups);
        assert_eq!(pool.len(), 3);

        // John Doeを招待済みにすると候補から消える
        dir.create_from_invite(
            &[Suggestion::User(sugg_users[0].clone()).to_tag()],
            Permission::ViewOnly,
            1.0,
        );
        let pool = available_suggestions(&sugg_users, &sugg_groups, &dir.users, &dir.groups);
        assert_eq!(pool.len(), 2);
        assert!(pool.iter().all(|s| s.id() != "suggest-1"));
    }

    #[test]
    fn test_filter_suggestions_matches_name_and_email() {
        let (sugg_users, sugg_groups) = MockDirectory::suggested(0.0);
        let pool = available_suggestions(&sugg_users, &sugg_groups, &[], &[]);

        assert!(filter_suggestions("", &pool).is_empty());
        assert!(filter_suggestions("   ", &pool).is_empty());

        let hits = filter_suggestions("WILSON", &pool);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), "suggest-2");

        // メールアドレスにも部分一致する
        let hits = filter_suggestions("john.doe@", &pool);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), "suggest-1");

        let hits = filter_suggestions("design", &pool);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), "suggest-group-1");
    }

    #[test]
    fn test_toggle_group_is_idempotent_per_click() {
        let mut expanded = HashSet::new();
        toggle_group(&mut expanded, "1");
        assert!(expanded.contains("1"));
        toggle_group(&mut expanded, "1");
        assert!(!expanded.contains("1"));
        toggle_group(&mut expanded, "1");
        assert!(expanded.contains("1"));
    }
}
