mod test_credential_store;
mod test_login_service;
mod test_token_properties;
