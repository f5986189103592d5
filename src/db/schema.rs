diesel::table! {
    mentions (id) {
        id -> BigInt,
        item_id -> Text,
        platform -> Text,
        processed_at -> Timestamptz,
        suggester -> Nullable<Text>,
        item_timestamp -> Nullable<BigInt>,
        suggestion_url -> Nullable<Text>,
        contribution_url -> Nullable<Text>,
        raw_data -> Text,
    }
}

diesel::table! {
    mention_logs (id) {
        id -> BigInt,
        platform -> Text,
        timestamp -> Timestamptz,
        action -> Text,
        details -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(mentions, mention_logs,);
