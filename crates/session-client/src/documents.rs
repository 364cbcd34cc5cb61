//! GraphQL documents used by the session client.

pub const LOGIN_OPERATION: &str = "Login";

pub const LOGIN_DOCUMENT: &str = r#"mutation Login($email: String!, $password: String!) {
  login(input: { email: $email, password: $password }) {
    accessToken
    refreshToken
    user {
      email
    }
  }
}"#;

pub const REGISTER_OPERATION: &str = "Register";

pub const REGISTER_DOCUMENT: &str = r#"mutation Register($input: RegisterInput!) {
  register(input: $input) {
    accessToken
    refreshToken
    user {
      id
      email
      firstName
      lastName
    }
  }
}"#;

pub const GET_ME_OPERATION: &str = "GetMe";

pub const GET_ME_DOCUMENT: &str = r#"query GetMe {
  me {
    id
    email
    firstName
    lastName
  }
}"#;
