// Subset of the ownCloud/CERNBox `oc_share` table touched by the migration.

diesel::table! {
    oc_share (id) {
        id -> BigInt,
        share_type -> Integer,
        uid_owner -> Varchar,
        item_type -> Nullable<Varchar>,
        item_source -> Nullable<Varchar>,
        item_target -> Nullable<Varchar>,
        file_source -> Nullable<BigInt>,
        file_target -> Nullable<Varchar>,
    }
}
