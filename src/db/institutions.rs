use std::collections::HashMap;

use sqlx::{FromRow, SqlitePool};

use crate::models::Institution;

#[derive(Debug, FromRow)]
struct InstitutionRow {
    id: i64,
    name: String,
}

#[derive(Debug, FromRow)]
struct CourseRow {
    institution_id: i64,
    course_name: String,
}

pub async fn fetch_institutions(db: &SqlitePool) -> Result<Vec<Institution>, sqlx::Error> {
    let rows = sqlx::query_as::<_, InstitutionRow>(
        "SELECT id, name FROM institutions ORDER BY name",
    )
    .fetch_all(db)
    .await?;

    let courses = sqlx::query_as::<_, CourseRow>(
        "SELECT institution_id, course_name FROM institution_courses ORDER BY course_name",
    )
    .fetch_all(db)
    .await?;

    let mut by_institution: HashMap<i64, Vec<String>> = HashMap::new();
    for course in courses {
        by_institution
            .entry(course.institution_id)
            .or_default()
            .push(course.course_name);
    }

    Ok(rows
        .into_iter()
        .map(|row| Institution {
            available_courses: by_institution.remove(&row.id).unwrap_or_default(),
            id: row.id,
            name: row.name,
        })
        .collect())
}

pub async fn find_institution(
    db: &SqlitePool,
    id: i64,
) -> Result<Option<Institution>, sqlx::Error> {
    let row = sqlx::query_as::<_, InstitutionRow>("SELECT id, name FROM institutions WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;

    let row = match row {
        Some(r) => r,
        None => return Ok(None),
    };

    let courses: Vec<String> = sqlx::query_scalar(
        "SELECT course_name FROM institution_courses WHERE institution_id = ? ORDER BY course_name",
    )
    .bind(id)
    .fetch_all(db)
    .await?;

    Ok(Some(Institution {
        id: row.id,
        name: row.name,
        available_courses: courses,
    }))
}

pub async fn institution_exists(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM institutions WHERE id = ?")
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(count > 0)
}
