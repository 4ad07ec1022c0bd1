//! Esquema Diesel (mantenido a mano junto a `migrations/`).

diesel::table! {
    workflows (id) {
        id -> Uuid,
        sequence_id -> BigInt,
        deviation_id -> Uuid,
        title -> Text,
        description -> Text,
        responsible_id -> Text,
        nature -> Text,
        deadline -> Timestamptz,
        status -> Text,
        response_notes -> Nullable<Text>,
        evidence_photos -> Jsonb,
        validator_notes -> Nullable<Text>,
        completed_at -> Nullable<Timestamptz>,
        version -> BigInt,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    workflow_history (workflow_id, seq) {
        workflow_id -> Uuid,
        seq -> BigInt,
        id -> Uuid,
        action -> Text,
        status_after -> Text,
        notes -> Nullable<Text>,
        photos -> Jsonb,
        performed_by -> Text,
        created_at -> Timestamptz,
        chain_hash -> Text,
    }
}

diesel::joinable!(workflow_history -> workflows (workflow_id));

diesel::allow_tables_to_appear_in_same_query!(workflows, workflow_history,);
