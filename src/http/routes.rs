//! The single table of protected routes and the minimum role each needs.
//!
//! Role checks are never written inside handlers; the server attaches one
//! guard per entry here, and config validation checks every role named
//! here exists.

/// A protected route and its minimum role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRule {
    pub path: &'static str,
    pub minimum_role: &'static str,
}

pub const LOGIN: &str = "/auth/login";
pub const HEALTH: &str = "/health";

pub const LOGOUT: RouteRule = RouteRule {
    path: "/auth/logout",
    minimum_role: "customer",
};

pub const ME: RouteRule = RouteRule {
    path: "/api/me",
    minimum_role: "customer",
};

pub const RESERVATIONS: RouteRule = RouteRule {
    path: "/api/reservations",
    minimum_role: "customer",
};

pub const REPORT_SUMMARY: RouteRule = RouteRule {
    path: "/api/reports/summary",
    minimum_role: "manager",
};

pub const ADMIN_STATUS: RouteRule = RouteRule {
    path: "/admin/status",
    minimum_role: "director",
};

pub const ROUTE_TABLE: &[RouteRule] = &[LOGOUT, ME, RESERVATIONS, REPORT_SUMMARY, ADMIN_STATUS];
