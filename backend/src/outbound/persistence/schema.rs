//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` when a migration changes a table.

diesel::table! {
    /// Registered accounts.
    users (id) {
        id -> Int8,
        username -> Varchar,
        email -> Varchar,
        /// Argon2id digest in PHC string format.
        password_digest -> Text,
        profile_image -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Manual headers. `step_revision` increments on every positional
    /// mutation of the manual's steps.
    manuals (id) {
        id -> Int8,
        owner_id -> Int8,
        title -> Text,
        description -> Nullable<Text>,
        category -> Nullable<Varchar>,
        is_public -> Bool,
        step_revision -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Steps; `(manual_id, order_number)` is unique, checked at commit.
    steps (id) {
        id -> Int8,
        manual_id -> Int8,
        order_number -> Int4,
        title -> Text,
        content -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Image metadata; bytes live in the upload directory.
    images (id) {
        id -> Int8,
        step_id -> Int8,
        file_path -> Text,
        file_name -> Varchar,
        file_size -> Int8,
        mime_type -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(manuals -> users (owner_id));
diesel::joinable!(steps -> manuals (manual_id));
diesel::joinable!(images -> steps (step_id));

diesel::allow_tables_to_appear_in_same_query!(users, manuals, steps, images);
