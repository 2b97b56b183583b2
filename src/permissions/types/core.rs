/*!
 * Permission Types
 * Roles, permissions and access decisions for the LMS client
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;
use thiserror::Error;

/// Result type for permission operations
pub type PermissionResult<T> = Result<T, PermissionError>;

/// Permission errors
///
/// Access checks themselves never fail; these cover parsing backend strings
/// and loading permission tables.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(rename_all = "snake_case", tag = "error")]
pub enum PermissionError {
    #[error("Unknown user type: {user_type}")]
    #[diagnostic(
        code(permissions::unknown_user_type),
        help("The backend returned a user type with no matching role. Re-authenticate or update the role mapping.")
    )]
    UnknownUserType { user_type: String },

    #[error("Unknown permission: {name}")]
    #[diagnostic(
        code(permissions::unknown_permission),
        help("Permission names are kebab-case, e.g. `create-homework`.")
    )]
    UnknownPermission { name: String },

    #[error("Unknown role: {name}")]
    #[diagnostic(code(permissions::unknown_role))]
    UnknownRole { name: String },

    #[error("Invalid permission table: {reason}")]
    #[diagnostic(
        code(permissions::invalid_table),
        help("Expected a JSON object mapping role names to arrays of permission names.")
    )]
    InvalidTable { reason: String },
}

/// Capability class of the signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Student,
    Parent,
    Teacher,
    InstituteAdmin,
    AttendanceMarker,
    OrganizationManager,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Student,
        Role::Parent,
        Role::Teacher,
        Role::InstituteAdmin,
        Role::AttendanceMarker,
        Role::OrganizationManager,
    ];

    /// Map a backend user-type string onto a role
    ///
    /// Case, `_`, `-` and spaces are ignored, so `INSTITUTE_ADMIN`,
    /// `institute-admin` and `InstituteAdmin` all resolve to the same role.
    pub fn from_user_type(user_type: &str) -> Option<Role> {
        let folded: String = user_type
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match folded.as_str() {
            "student" => Some(Role::Student),
            "parent" => Some(Role::Parent),
            "teacher" => Some(Role::Teacher),
            "instituteadmin" => Some(Role::InstituteAdmin),
            "attendancemarker" => Some(Role::AttendanceMarker),
            "organizationmanager" => Some(Role::OrganizationManager),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Parent => "Parent",
            Role::Teacher => "Teacher",
            Role::InstituteAdmin => "InstituteAdmin",
            Role::AttendanceMarker => "AttendanceMarker",
            Role::OrganizationManager => "OrganizationManager",
        }
    }

    /// Roles whose denials are treated as critical in the audit trail
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::InstituteAdmin | Role::OrganizationManager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::from_user_type(s).ok_or_else(|| PermissionError::UnknownRole { name: s.to_string() })
    }
}

macro_rules! permissions {
    ($($(#[$meta:meta])* $variant:ident => $name:literal,)+) => {
        /// Atomic named action a role may be granted
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Permission {
            $(
                $(#[$meta])*
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl Permission {
            /// Every permission, in declaration order
            pub const ALL: &'static [Permission] = &[$(Permission::$variant,)+];

            /// Stable kebab-case name
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Permission::$variant => $name,)+
                }
            }
        }

        impl FromStr for Permission {
            type Err = PermissionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Permission::$variant),)+
                    _ => Err(PermissionError::UnknownPermission { name: s.to_string() }),
                }
            }
        }
    };
}

permissions! {
    ViewDashboard => "view-dashboard",
    ViewProfile => "view-profile",

    ViewOrganizations => "view-organizations",
    ManageOrganizations => "manage-organizations",

    ViewInstitutes => "view-institutes",
    CreateInstitute => "create-institute",
    EditInstitute => "edit-institute",
    DeleteInstitute => "delete-institute",

    ViewClasses => "view-classes",
    CreateClass => "create-class",
    EditClass => "edit-class",
    DeleteClass => "delete-class",
    EnrollStudents => "enroll-students",

    ViewSubjects => "view-subjects",
    CreateSubject => "create-subject",
    EditSubject => "edit-subject",
    DeleteSubject => "delete-subject",

    ViewUsers => "view-users",
    CreateUser => "create-user",
    EditUser => "edit-user",
    DeleteUser => "delete-user",
    /// Parent view of linked student accounts
    ViewChildren => "view-children",

    ViewHomework => "view-homework",
    CreateHomework => "create-homework",
    EditHomework => "edit-homework",
    DeleteHomework => "delete-homework",
    SubmitHomework => "submit-homework",
    GradeHomework => "grade-homework",

    ViewExams => "view-exams",
    CreateExam => "create-exam",
    EditExam => "edit-exam",
    DeleteExam => "delete-exam",
    ViewResults => "view-results",
    PublishResults => "publish-results",

    ViewLectures => "view-lectures",
    CreateLecture => "create-lecture",
    EditLecture => "edit-lecture",
    DeleteLecture => "delete-lecture",

    ViewAttendance => "view-attendance",
    MarkAttendance => "mark-attendance",
    /// Card tap (RFID/NFC) attendance
    MarkRfidAttendance => "mark-rfid-attendance",
    MarkTransportAttendance => "mark-transport-attendance",
    MarkBookhireAttendance => "mark-bookhire-attendance",

    ViewTransport => "view-transport",
    ManageTransport => "manage-transport",

    ViewPayments => "view-payments",
    SubmitPayment => "submit-payment",
    VerifyPayment => "verify-payment",
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an access request is aimed at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum AccessTarget {
    Permission(Permission),
    Route(String),
}

/// Access request
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AccessRequest {
    pub role: Role,
    pub target: AccessTarget,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub timestamp: SystemTime,
}

impl AccessRequest {
    pub fn new(role: Role, target: AccessTarget) -> Self {
        Self {
            role,
            target,
            timestamp: SystemTime::now(),
        }
    }

    pub fn permission(role: Role, permission: Permission) -> Self {
        Self::new(role, AccessTarget::Permission(permission))
    }

    pub fn route(role: Role, route: impl Into<String>) -> Self {
        Self::new(role, AccessTarget::Route(route.into()))
    }
}

/// Access decision
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AccessDecision {
    pub request: AccessRequest,
    pub allowed: bool,
    pub reason: String,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub decided_at: SystemTime,
}

impl AccessDecision {
    pub fn allow(request: AccessRequest, reason: impl Into<String>) -> Self {
        Self {
            request,
            allowed: true,
            reason: reason.into(),
            decided_at: SystemTime::now(),
        }
    }

    pub fn deny(request: AccessRequest, reason: impl Into<String>) -> Self {
        Self {
            request,
            allowed: false,
            reason: reason.into(),
            decided_at: SystemTime::now(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}
