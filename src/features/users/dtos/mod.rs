mod user_dto;

pub use user_dto::{
    AddMembershipDto, CreateUserDto, MembershipsResponseDto, RemoveMembershipDto,
    UpdateUserDto, UserProfileDto, UserResponseDto,
};
