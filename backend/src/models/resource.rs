/// Whether a proxied call must carry the caller's access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRequirement {
    /// Fail before any network call when the access cookie is absent
    Required,
    /// Attach the token when present
    Optional,
}

/// Backend collections mirrored under `/api`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Category,
    Subcategory,
    Content,
    Lesson,
    AdminUser,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Category,
        Resource::Subcategory,
        Resource::Content,
        Resource::Lesson,
        Resource::AdminUser,
    ];

    /// Local mount point, relative to `/api`
    pub const fn local_path(self) -> &'static str {
        match self {
            Self::Category => "/categories",
            Self::Subcategory => "/subcategories",
            Self::Content => "/content",
            Self::Lesson => "/lessons",
            Self::AdminUser => "/admin/users",
        }
    }

    /// Collection path on the backend
    pub const fn backend_path(self) -> &'static str {
        match self {
            Self::Category => "/category/",
            Self::Subcategory => "/subcategory/",
            Self::Content => "/content/",
            Self::Lesson => "/lesson/",
            Self::AdminUser => "/auth/adminuserlist/",
        }
    }

    pub fn item_path(self, id: &str) -> String {
        format!("{}{}/", self.backend_path(), id)
    }

    /// Catalog reads are public; everything else needs a session.
    pub const fn read_auth(self) -> AuthRequirement {
        match self {
            Self::Category | Self::Subcategory => AuthRequirement::Optional,
            Self::Content | Self::Lesson | Self::AdminUser => AuthRequirement::Required,
        }
    }

    /// List fetches that degrade to `[]` on "no data"/"not logged in" errors.
    pub const fn lists_fall_back_to_empty(self) -> bool {
        matches!(self, Self::Content | Self::Lesson)
    }
}
