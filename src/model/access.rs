use uuid::Uuid;

use crate::{
    model::{
        ModelManager,
        error::{DatabaseError, DatabaseResult},
    },
    web::{AuthenticatedUser, UserRole},
};

/// Resources with an owning user: the author for threads and reviews, the
/// course instructor for course content.
#[async_trait::async_trait]
pub trait HasOwner {
    type OwnerId: PartialEq + Send + Sync;
    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        ctx: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId>;
}

pub async fn check_access<T: HasOwner<OwnerId = O> + Sync, O: PartialEq + Send + Sync>(
    mm: &ModelManager,
    ctx: &AuthenticatedUser,
    resource: &T,
    expected: O,
) -> DatabaseResult<()> {
    // admins manage every course and moderate every thread
    if ctx.user_role() == UserRole::Admin {
        return Ok(());
    }

    let actual_owner = resource.get_owner_id(mm, ctx).await?;

    if actual_owner == expected {
        Ok(())
    } else {
        Err(DatabaseError::Forbidden)
    }
}

/// Instructor of the course `module_id` belongs to; `None` for a missing
/// module or a course without instructor.
pub async fn module_instructor(mm: &ModelManager, module_id: Uuid) -> DatabaseResult<Option<Uuid>> {
    let owner: Option<Option<Uuid>> = sqlx::query_scalar(
        r#"
        SELECT c.instructor_id
        FROM modules m
        JOIN courses c ON c.id = m.course_id
        WHERE m.id = $1
        "#,
    )
    .bind(module_id)
    .fetch_optional(mm.executor())
    .await?;

    Ok(owner.flatten())
}
