//! UI language and the catalogue of status messages.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    #[default]
    En,
    ZhCn,
}

impl Lang {
    pub fn code(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::ZhCn => "zh-CN",
        }
    }

    /// Unknown codes fall back to English.
    pub fn from_code(code: &str) -> Self {
        match code {
            "zh-CN" | "zh" => Lang::ZhCn,
            _ => Lang::En,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Lang::En => Lang::ZhCn,
            Lang::ZhCn => Lang::En,
        }
    }
}

/// Every user-visible status line.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    FillCredentials,
    LoggingIn,
    LoginSuccess,
    LoginFailed { detail: String },
    LoggedOut,
    SessionExpired,
    LoadingEmails,
    EmailsLoadFailed { detail: String },
    EmailBodyFailed { detail: String },
    Thinking,
    EmptyAnswer,
    RequestFailed { detail: String },
    HistoryFailed { detail: String },
    LoadingChatMessages,
    ChatMessagesFailed { detail: String },
    SwitchedSession { chat_id: String },
    ResetSession { chat_id: String },
    MailboxesFailed { detail: String },
    SyncingMailbox { email: String },
    SyncedMailbox { email: String, count: u64 },
    SyncNeedsReauth { detail: String },
    AwaitingAuthorization,
    OpenBrowserManually { url: String },
    FetchingGmailProfile,
    LinkingMailbox { email: String },
    GmailConnectSuccess { count: u64 },
    GmailLinkFailed { detail: String },
    LanguageChanged,
}

impl Msg {
    pub fn render(&self, lang: Lang) -> String {
        match lang {
            Lang::En => self.en(),
            Lang::ZhCn => self.zh_cn(),
        }
    }

    fn en(&self) -> String {
        match self {
            Msg::FillCredentials => "Please enter user ID and password".into(),
            Msg::LoggingIn => "Logging in...".into(),
            Msg::LoginSuccess => "Login successful".into(),
            Msg::LoginFailed { detail } => format!("Login failed: {detail}"),
            Msg::LoggedOut => "Logged out".into(),
            Msg::SessionExpired => "Session expired, please log in again".into(),
            Msg::LoadingEmails => "Loading email list...".into(),
            Msg::EmailsLoadFailed { detail } => format!("Unable to load emails: {detail}"),
            Msg::EmailBodyFailed { detail } => format!("Failed to load email body: {detail}"),
            Msg::Thinking => "AI is thinking...".into(),
            Msg::EmptyAnswer => "(No response)".into(),
            Msg::RequestFailed { detail } => format!("Request failed: {detail}"),
            Msg::HistoryFailed { detail } => format!("Failed to load chat history: {detail}"),
            Msg::LoadingChatMessages => "Loading chat messages...".into(),
            Msg::ChatMessagesFailed { detail } => format!("Failed to load chat messages: {detail}"),
            Msg::SwitchedSession { chat_id } => format!("Switched to session {chat_id}"),
            Msg::ResetSession { chat_id } => format!("Switched chat_id: {chat_id}"),
            Msg::MailboxesFailed { detail } => format!("Failed to load mailboxes: {detail}"),
            Msg::SyncingMailbox { email } => format!("Syncing {email}..."),
            Msg::SyncedMailbox { email, count } => format!("{email} synced, added {count} messages"),
            Msg::SyncNeedsReauth { detail } => {
                format!("Sync failed ({detail}), re-authorizing Gmail...")
            }
            Msg::AwaitingAuthorization => {
                "Waiting for Gmail authorization in the browser...".into()
            }
            Msg::OpenBrowserManually { url } => format!("Open this URL to authorize: {url}"),
            Msg::FetchingGmailProfile => "Fetching Gmail account info...".into(),
            Msg::LinkingMailbox { email } => format!("Linking {email} and fetching emails..."),
            Msg::GmailConnectSuccess { count } => format!("Gmail linked, fetched {count} emails"),
            Msg::GmailLinkFailed { detail } => format!("Gmail authorization failed: {detail}"),
            Msg::LanguageChanged => "Language: English".into(),
        }
    }

    fn zh_cn(&self) -> String {
        match self {
            Msg::FillCredentials => "请填写用户ID和密码".into(),
            Msg::LoggingIn => "正在登录...".into(),
            Msg::LoginSuccess => "登录成功".into(),
            Msg::LoginFailed { detail } => format!("登录失败：{detail}"),
            Msg::LoggedOut => "已退出登录".into(),
            Msg::SessionExpired => "登录已失效，请重新登录".into(),
            Msg::LoadingEmails => "正在加载邮件列表...".into(),
            Msg::EmailsLoadFailed { detail } => format!("无法加载邮件：{detail}"),
            Msg::EmailBodyFailed { detail } => format!("加载正文失败：{detail}"),
            Msg::Thinking => "AI 思考中...".into(),
            Msg::EmptyAnswer => "（空响应）".into(),
            Msg::RequestFailed { detail } => format!("请求失败：{detail}"),
            Msg::HistoryFailed { detail } => format!("加载聊天历史失败：{detail}"),
            Msg::LoadingChatMessages => "正在加载聊天记录...".into(),
            Msg::ChatMessagesFailed { detail } => format!("加载聊天记录失败：{detail}"),
            Msg::SwitchedSession { chat_id } => format!("已切换到会话 {chat_id}"),
            Msg::ResetSession { chat_id } => format!("已切换 chat_id: {chat_id}"),
            Msg::MailboxesFailed { detail } => format!("加载邮箱失败：{detail}"),
            Msg::SyncingMailbox { email } => format!("正在同步 {email}..."),
            Msg::SyncedMailbox { email, count } => format!("{email} 已同步，新增 {count} 封"),
            Msg::SyncNeedsReauth { detail } => format!("同步失败（{detail}），正在重新授权 Gmail..."),
            Msg::AwaitingAuthorization => "正在浏览器中等待 Gmail 授权...".into(),
            Msg::OpenBrowserManually { url } => format!("请打开此链接完成授权：{url}"),
            Msg::FetchingGmailProfile => "正在获取 Gmail 账户信息...".into(),
            Msg::LinkingMailbox { email } => format!("正在链接 {email} 并抓取邮件..."),
            Msg::GmailConnectSuccess { count } => format!("Gmail 链接成功，已抓取 {count} 封邮件"),
            Msg::GmailLinkFailed { detail } => format!("Gmail 授权失败：{detail}"),
            Msg::LanguageChanged => "语言：简体中文".into(),
        }
    }
}

/// Defines a fixed UI label in every language.
macro_rules! label {
    ($name:ident, $en:expr, $zh:expr) => {
        pub fn $name(lang: Lang) -> &'static str {
            match lang {
                Lang::En => $en,
                Lang::ZhCn => $zh,
            }
        }
    };
}

/// Titles, captions and key hints of the terminal views.
pub mod tui {
    use super::Lang;

    // ── login ──
    label!(sign_in_title, "Inbox Assistant · Sign in", "收件箱助手 · 登录");
    label!(api_base, "API base", "API 地址");
    label!(user_id, "User ID", "用户ID");
    label!(password, "Password", "密码");
    label!(signing_in, "signing in...", "正在登录...");

    // ── inbox ──
    label!(search_title, "Search", "搜索");
    label!(search_hint, "/ to search this page", "按 / 搜索本页");
    label!(inbox_title, "Inbox", "收件箱");
    label!(promo_tag, "promo", "推广");
    label!(kind_all, "all", "全部");
    label!(kind_primary, "primary", "主要");
    label!(kind_promotions, "promotions", "推广");
    label!(quadrant_do_first, "Do first", "立即处理");
    label!(quadrant_schedule, "Schedule", "计划");
    label!(quadrant_delegate, "Delegate", "委派");
    label!(quadrant_later, "Later", "稍后");

    // ── detail ──
    label!(email_title, "Email", "邮件");
    label!(
        no_emails_hint,
        "No emails yet. Link a Gmail account from the user center (u).",
        "暂无邮件。请在用户中心 (u) 链接 Gmail 账户。"
    );
    label!(select_hint, "Select an email and press Enter.", "选择一封邮件并按 Enter。");
    label!(from, "From", "发件人");
    label!(time, "Time", "时间");
    label!(to, "To", "收件人");
    label!(importance, "importance", "重要度");
    label!(promotion, "promotion", "推广");
    label!(loading, "Loading...", "加载中...");

    // ── chat ──
    label!(assistant_title, "Assistant", "助手");
    label!(you, "You", "你");
    label!(sources, "sources", "引用来源");
    label!(ask_title, "Ask", "提问");
    label!(waiting_for_answer, "waiting for the answer...", "正在等待回答...");

    // ── overlays ──
    label!(history_title, "Chat history", "聊天历史");
    label!(no_sessions, "No previous sessions.", "暂无历史会话。");
    label!(user_center_title, "User center", "用户中心");
    label!(user, "User", "用户");
    label!(linked_mailboxes, "Linked mailboxes", "已链接邮箱");
    label!(
        no_mailboxes,
        "No linked mailboxes. Press c to connect Gmail.",
        "尚未链接邮箱，按 c 连接 Gmail。"
    );
    label!(last_sync, "last sync", "上次同步");
    label!(linked_at, "linked", "链接于");
    label!(synced_at, "synced", "同步于");

    // ── key hints ──
    label!(hint_field, "field", "切换输入");
    label!(hint_sign_in, "sign in", "登录");
    label!(hint_language, "language", "语言");
    label!(hint_quit, "quit", "退出");
    label!(hint_move, "move", "移动");
    label!(hint_open, "open", "打开");
    label!(hint_close, "close", "关闭");
    label!(hint_connect, "connect Gmail", "连接 Gmail");
    label!(hint_sync, "sync", "同步");
    label!(hint_reload, "reload", "重新加载");
    label!(hint_layout, "layout", "布局");
    label!(hint_send, "send", "发送");
    label!(hint_sources, "sources", "引用");
    label!(hint_pick_answer, "pick answer", "选择回答");
    label!(hint_scroll, "scroll", "滚动");
    label!(hint_back, "back", "返回");
    label!(hint_done, "done", "完成");
    label!(hint_focus, "focus", "焦点");
    label!(hint_page, "page", "翻页");
    label!(hint_refresh, "refresh", "刷新");
    label!(hint_search, "search", "搜索");
    label!(hint_group, "quadrants", "四象限");
    label!(hint_kind, "type", "类型");
    label!(hint_history, "history", "历史");
    label!(hint_new_chat, "new chat", "新会话");
    label!(hint_user, "user", "用户");
    label!(hint_logout, "logout", "退出登录");
}
