mod helpers;
mod remote_signing_tests;
