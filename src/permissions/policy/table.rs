/*!
 * Role Permission Table
 * Role to granted-permission mapping, built once and injected into the engine
 */

use crate::permissions::types::{Permission, PermissionError, PermissionResult, Role};
use ahash::RandomState;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// Grants of the standard LMS deployment
///
/// The match is exhaustive so adding a role forces a decision here.
fn standard_grants(role: Role) -> &'static [Permission] {
    use Permission::*;

    match role {
        Role::Student => &[
            ViewDashboard,
            ViewProfile,
            ViewInstitutes,
            ViewClasses,
            ViewSubjects,
            ViewHomework,
            SubmitHomework,
            ViewExams,
            ViewResults,
            ViewLectures,
            ViewAttendance,
            ViewTransport,
            ViewPayments,
            SubmitPayment,
        ],
        Role::Parent => &[
            ViewDashboard,
            ViewProfile,
            ViewChildren,
            ViewHomework,
            ViewExams,
            ViewResults,
            ViewLectures,
            ViewAttendance,
            ViewTransport,
            ViewPayments,
            SubmitPayment,
        ],
        Role::Teacher => &[
            ViewDashboard,
            ViewProfile,
            ViewInstitutes,
            ViewClasses,
            ViewSubjects,
            ViewUsers,
            ViewHomework,
            CreateHomework,
            EditHomework,
            DeleteHomework,
            GradeHomework,
            ViewExams,
            CreateExam,
            EditExam,
            ViewResults,
            PublishResults,
            ViewLectures,
            CreateLecture,
            EditLecture,
            DeleteLecture,
            ViewAttendance,
            MarkAttendance,
        ],
        Role::InstituteAdmin => &[
            ViewDashboard,
            ViewProfile,
            ViewInstitutes,
            EditInstitute,
            ViewClasses,
            CreateClass,
            EditClass,
            DeleteClass,
            EnrollStudents,
            ViewSubjects,
            CreateSubject,
            EditSubject,
            DeleteSubject,
            ViewUsers,
            CreateUser,
            EditUser,
            DeleteUser,
            ViewHomework,
            CreateHomework,
            EditHomework,
            DeleteHomework,
            GradeHomework,
            ViewExams,
            CreateExam,
            EditExam,
            DeleteExam,
            ViewResults,
            PublishResults,
            ViewLectures,
            CreateLecture,
            EditLecture,
            DeleteLecture,
            ViewAttendance,
            MarkAttendance,
            MarkRfidAttendance,
            MarkTransportAttendance,
            MarkBookhireAttendance,
            ViewTransport,
            ManageTransport,
            ViewPayments,
            VerifyPayment,
        ],
        Role::AttendanceMarker => &[
            ViewDashboard,
            ViewProfile,
            ViewInstitutes,
            ViewClasses,
            ViewAttendance,
            MarkAttendance,
            MarkRfidAttendance,
            MarkTransportAttendance,
            MarkBookhireAttendance,
            ViewTransport,
        ],
        Role::OrganizationManager => &[
            ViewDashboard,
            ViewProfile,
            ViewOrganizations,
            ManageOrganizations,
            ViewInstitutes,
            CreateInstitute,
            EditInstitute,
            DeleteInstitute,
            ViewUsers,
            ViewLectures,
            CreateLecture,
            EditLecture,
            DeleteLecture,
            ViewPayments,
            VerifyPayment,
        ],
    }
}

/// Mapping from role to its granted permissions
///
/// Immutable once built. Roles without an entry hold no permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePermissionTable {
    grants: HashMap<Role, BTreeSet<Permission>, RandomState>,
}

impl RolePermissionTable {
    /// Table of the standard deployment, one entry per role
    pub fn standard() -> Self {
        Self::from_entries(
            Role::ALL
                .iter()
                .map(|role| (*role, standard_grants(*role).iter().copied())),
        )
    }

    /// Table granting nothing to anyone
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from explicit entries; repeated roles are merged
    pub fn from_entries<R, P>(entries: R) -> Self
    where
        R: IntoIterator<Item = (Role, P)>,
        P: IntoIterator<Item = Permission>,
    {
        let mut grants: HashMap<Role, BTreeSet<Permission>, RandomState> = HashMap::default();
        for (role, permissions) in entries {
            grants.entry(role).or_default().extend(permissions);
        }
        Self { grants }
    }

    /// Parse `{ "<role>": ["<permission>", ...] }`
    pub fn from_json_str(json: &str) -> PermissionResult<Self> {
        let raw: HashMap<String, Vec<String>> = serde_json::from_str(json)
            .map_err(|e| PermissionError::InvalidTable {
                reason: e.to_string(),
            })?;

        let mut entries = Vec::with_capacity(raw.len());
        for (role_name, names) in raw {
            let role: Role = role_name.parse()?;
            let permissions = names
                .iter()
                .map(|name| name.parse::<Permission>())
                .collect::<PermissionResult<Vec<_>>>()?;
            entries.push((role, permissions));
        }

        Ok(Self::from_entries(entries))
    }

    /// Load a JSON table from disk
    pub fn from_json_file(path: impl AsRef<Path>) -> PermissionResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| PermissionError::InvalidTable {
            reason: format!("{}: {}", path.display(), e),
        })?;
        Self::from_json_str(&json)
    }

    /// Explicit entry for a role, if the table has one
    pub fn grants(&self, role: Role) -> Option<&BTreeSet<Permission>> {
        self.grants.get(&role)
    }

    /// Missing roles hold nothing
    pub fn contains(&self, role: Role, permission: Permission) -> bool {
        match self.grants.get(&role) {
            Some(set) => set.contains(&permission),
            None => false,
        }
    }

    /// Roles with an explicit entry
    pub fn roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.grants.keys().copied().collect();
        roles.sort();
        roles
    }
}
