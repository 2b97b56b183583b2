/*!
 * Route Table
 * Logical route path to required permission
 */

use crate::permissions::types::Permission;
use ahash::RandomState;
use std::collections::HashMap;

/// Routes of the standard LMS shell
const STANDARD_ROUTES: &[(&str, Permission)] = &[
    ("/dashboard", Permission::ViewDashboard),
    ("/profile", Permission::ViewProfile),
    ("/organizations", Permission::ViewOrganizations),
    ("/organizations/manage", Permission::ManageOrganizations),
    ("/institutes", Permission::ViewInstitutes),
    ("/institutes/create", Permission::CreateInstitute),
    ("/classes", Permission::ViewClasses),
    ("/classes/create", Permission::CreateClass),
    ("/classes/enroll", Permission::EnrollStudents),
    ("/subjects", Permission::ViewSubjects),
    ("/subjects/create", Permission::CreateSubject),
    ("/users", Permission::ViewUsers),
    ("/users/create", Permission::CreateUser),
    ("/my-children", Permission::ViewChildren),
    ("/homework", Permission::ViewHomework),
    ("/homework/create", Permission::CreateHomework),
    ("/homework/submissions", Permission::GradeHomework),
    ("/exams", Permission::ViewExams),
    ("/exams/create", Permission::CreateExam),
    ("/results", Permission::ViewResults),
    ("/lectures", Permission::ViewLectures),
    ("/lectures/create", Permission::CreateLecture),
    ("/attendance", Permission::ViewAttendance),
    ("/attendance/mark", Permission::MarkAttendance),
    ("/attendance/rfid", Permission::MarkRfidAttendance),
    ("/attendance/transport", Permission::MarkTransportAttendance),
    ("/attendance/bookhire", Permission::MarkBookhireAttendance),
    ("/transport", Permission::ViewTransport),
    ("/transport/manage", Permission::ManageTransport),
    ("/payments", Permission::ViewPayments),
    ("/payments/submit", Permission::SubmitPayment),
    ("/payments/verify", Permission::VerifyPayment),
];

/// Strip query, fragment and one trailing slash
///
/// `/homework/?tab=open` and `/homework#top` both become `/homework`.
pub fn normalize_route(route: &str) -> &str {
    let end = route.find(['?', '#']).unwrap_or(route.len());
    let path = &route[..end];
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

/// Mapping from route path to the single permission it requires
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: HashMap<String, Permission, RandomState>,
}

impl RouteTable {
    pub fn standard() -> Self {
        Self::from_entries(STANDARD_ROUTES.iter().copied())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from explicit entries; later entries replace earlier ones
    pub fn from_entries<S: AsRef<str>>(entries: impl IntoIterator<Item = (S, Permission)>) -> Self {
        let mut table = Self::default();
        for (route, permission) in entries {
            table.insert(route.as_ref(), permission);
        }
        table
    }

    pub fn insert(&mut self, route: &str, permission: Permission) -> Option<Permission> {
        self.routes
            .insert(normalize_route(route).to_string(), permission)
    }

    /// Permission required by a route, `None` when the route is not declared
    pub fn required(&self, route: &str) -> Option<Permission> {
        self.routes.get(normalize_route(route)).copied()
    }

    /// All declared routes with their permission, sorted by path
    pub fn entries(&self) -> Vec<(&str, Permission)> {
        let mut entries: Vec<(&str, Permission)> = self
            .routes
            .iter()
            .map(|(route, permission)| (route.as_str(), *permission))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
